//! File intake validation
//!
//! The size check lives in exactly one place, [`FileIntakeValidator::classify`]; the
//! oversized summary is always recomputed from the set it describes.

pub mod mime;

pub use mime::{content_type_for_extension, content_type_for_path};

use serde::Serialize;

use crate::constants::BYTES_PER_MB;
use crate::models::{CandidateSet, FileCandidate};

/// Result of checking one candidate against the ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub oversized: bool,
}

/// Oversized summary for a candidate set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntakeSummary {
    pub oversized_count: usize,
    /// Empty when `oversized_count == 0`.
    pub message: String,
    /// Names of the oversized files, in set order.
    pub rejected: Vec<String>,
}

impl IntakeSummary {
    pub fn is_clear(&self) -> bool {
        self.oversized_count == 0
    }
}

/// Classifies candidates against a per-file size ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileIntakeValidator {
    max_file_size: u64,
}

impl FileIntakeValidator {
    pub fn new(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    pub fn classify(&self, file: &FileCandidate) -> Classification {
        Classification {
            oversized: file.size_bytes > self.max_file_size,
        }
    }

    pub fn is_oversized(&self, file: &FileCandidate) -> bool {
        self.classify(file).oversized
    }

    /// Append `incoming` to a copy of `set`. Nothing is deduplicated or rejected.
    pub fn add(
        &self,
        set: &CandidateSet,
        incoming: impl IntoIterator<Item = FileCandidate>,
    ) -> CandidateSet {
        set.iter().cloned().chain(incoming).collect()
    }

    /// Copy of `set` without the entry at `index`. Out-of-range indexes leave it as is.
    pub fn remove(&self, set: &CandidateSet, index: usize) -> CandidateSet {
        set.iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, file)| file.clone())
            .collect()
    }

    pub fn summarize(&self, set: &CandidateSet) -> IntakeSummary {
        let rejected: Vec<String> = set
            .iter()
            .filter(|file| self.is_oversized(file))
            .map(|file| file.name.clone())
            .collect();

        let message = if rejected.is_empty() {
            String::new()
        } else {
            format!(
                "Some files exceed the {} limit, remove them to continue",
                format_limit(self.max_file_size)
            )
        };

        IntakeSummary {
            oversized_count: rejected.len(),
            message,
            rejected,
        }
    }

    /// Candidates that will actually be transmitted.
    pub fn eligible<'a>(&self, set: &'a CandidateSet) -> Vec<&'a FileCandidate> {
        set.iter().filter(|file| !self.is_oversized(file)).collect()
    }
}

fn format_limit(bytes: u64) -> String {
    if bytes % BYTES_PER_MB == 0 {
        format!("{}MB", bytes / BYTES_PER_MB)
    } else {
        format!("{:.2}MB", bytes as f64 / BYTES_PER_MB as f64)
    }
}

/// Owned intake state: the current candidate set plus the validator that judges it.
///
/// Mutators replace the set wholesale. The summary is computed from the current set
/// on every read, so it cannot lag behind a mutation.
#[derive(Debug, Clone)]
pub struct Intake {
    validator: FileIntakeValidator,
    files: CandidateSet,
}

impl Intake {
    pub fn new(validator: FileIntakeValidator) -> Self {
        Self {
            validator,
            files: CandidateSet::new(),
        }
    }

    pub fn validator(&self) -> FileIntakeValidator {
        self.validator
    }

    pub fn files(&self) -> &CandidateSet {
        &self.files
    }

    /// Add selected or dropped files. Returns the summary of the full post-add set.
    pub fn add(&mut self, incoming: impl IntoIterator<Item = FileCandidate>) -> IntakeSummary {
        self.files = self.validator.add(&self.files, incoming);
        self.summary()
    }

    pub fn remove(&mut self, index: usize) -> IntakeSummary {
        self.files = self.validator.remove(&self.files, index);
        self.summary()
    }

    pub fn clear(&mut self) {
        self.files = CandidateSet::new();
    }

    pub fn summary(&self) -> IntakeSummary {
        self.validator.summarize(&self.files)
    }

    pub fn eligible(&self) -> Vec<&FileCandidate> {
        self.validator.eligible(&self.files)
    }

    /// Whether submitting makes sense at all (at least one file within the ceiling).
    pub fn has_eligible(&self) -> bool {
        self.files.iter().any(|file| !self.validator.is_oversized(file))
    }
}
