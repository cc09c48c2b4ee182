use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::constants::BYTES_PER_MB;
use crate::error::ShipError;
use crate::validation::mime::content_type_for_path;

/// Where a candidate's bytes live.
#[derive(Debug, Clone)]
pub enum FileSource {
    /// A file on disk, read lazily when it is sent or previewed.
    Path(PathBuf),
    /// Bytes already held in memory (dropped or pasted content).
    Memory(Bytes),
}

impl FileSource {
    /// Read the whole payload.
    pub async fn read_all(&self) -> Result<Bytes, ShipError> {
        match self {
            FileSource::Path(path) => Ok(Bytes::from(tokio::fs::read(path).await?)),
            FileSource::Memory(data) => Ok(data.clone()),
        }
    }
}

/// A file the user selected or dropped.
#[derive(Debug, Clone)]
pub struct FileCandidate {
    pub name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub raw: FileSource,
}

impl FileCandidate {
    pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, data: Bytes) -> Self {
        Self {
            name: name.into(),
            size_bytes: data.len() as u64,
            mime_type: mime_type.into(),
            raw: FileSource::Memory(data),
        }
    }

    /// Stat a local file and build a candidate for it. The mime type comes from the
    /// file extension.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, ShipError> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(ShipError::InvalidInput(format!(
                "not a regular file: {}",
                path.display()
            )));
        }

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| ShipError::InvalidInput(format!("invalid file name: {}", path.display())))?;

        Ok(Self {
            name,
            size_bytes: metadata.len(),
            mime_type: content_type_for_path(path).to_string(),
            raw: FileSource::Path(path.to_path_buf()),
        })
    }

    /// Size formatted the way listings show it, e.g. `5.00 MB`.
    pub fn display_size(&self) -> String {
        format!("{:.2} MB", self.size_bytes as f64 / BYTES_PER_MB as f64)
    }
}

/// Ordered list of candidates. Insertion order is kept and duplicates are allowed.
///
/// The set is a value: intake operations return a new set instead of editing one in
/// place.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    files: Vec<FileCandidate>,
}

impl CandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FileCandidate> {
        self.files.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileCandidate> {
        self.files.iter()
    }

    pub fn as_slice(&self) -> &[FileCandidate] {
        &self.files
    }

    /// Label shown on the drop area.
    pub fn selection_label(&self) -> String {
        if self.files.is_empty() {
            "Drag and drop or click to select".to_string()
        } else {
            format!("{} file(s) selected", self.files.len())
        }
    }
}

impl From<Vec<FileCandidate>> for CandidateSet {
    fn from(files: Vec<FileCandidate>) -> Self {
        Self { files }
    }
}

impl FromIterator<FileCandidate> for CandidateSet {
    fn from_iter<I: IntoIterator<Item = FileCandidate>>(iter: I) -> Self {
        Self {
            files: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_from_path_reads_size_and_mime() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.JPG");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&[0u8; 2048]).unwrap();

        let candidate = FileCandidate::from_path(&path).await.unwrap();
        assert_eq!(candidate.name, "photo.JPG");
        assert_eq!(candidate.size_bytes, 2048);
        assert_eq!(candidate.mime_type, "image/jpeg");
        assert!(matches!(candidate.raw, FileSource::Path(_)));
    }

    #[tokio::test]
    async fn test_from_path_rejects_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileCandidate::from_path(dir.path()).await.unwrap_err();
        assert!(matches!(err, ShipError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_read_all_memory() {
        let candidate = FileCandidate::from_bytes("a.txt", "text/plain", Bytes::from_static(b"hi"));
        assert_eq!(candidate.raw.read_all().await.unwrap(), Bytes::from_static(b"hi"));
    }

    #[test]
    fn test_display_size() {
        let candidate = FileCandidate {
            name: "b.bin".to_string(),
            size_bytes: 5 * BYTES_PER_MB + BYTES_PER_MB / 4,
            mime_type: "application/octet-stream".to_string(),
            raw: FileSource::Memory(Bytes::new()),
        };
        assert_eq!(candidate.display_size(), "5.25 MB");
    }

    #[test]
    fn test_selection_label() {
        let mut set = CandidateSet::new();
        assert_eq!(set.selection_label(), "Drag and drop or click to select");
        set = CandidateSet::from(vec![
            FileCandidate::from_bytes("a", "text/plain", Bytes::new()),
            FileCandidate::from_bytes("a", "text/plain", Bytes::new()),
        ]);
        assert_eq!(set.selection_label(), "2 file(s) selected");
    }
}
