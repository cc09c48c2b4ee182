use std::path::PathBuf;

use anyhow::Context;
use serde::Serialize;
use smartship_client::Notifier;
use smartship_core::{
    ErrorMetadata, FileCandidate, Intake, Notification, NotificationLevel, ShipError,
};

/// Prints notifications to stderr so stdout stays machine-readable.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: Notification) {
        eprintln!("{}", format_notification(&notification));
    }
}

pub fn format_notification(notification: &Notification) -> String {
    let tag = match notification.level {
        NotificationLevel::Info => "info",
        NotificationLevel::Success => "ok",
        NotificationLevel::Error => "error",
    };
    format!("[{}] {}", tag, notification.message)
}

/// User-facing text for a failed command, with the suggested next step when there
/// is one.
pub fn describe_error(error: &ShipError) -> String {
    match error.suggested_action() {
        Some(action) => format!("{}\n  hint: {}", error.client_message(), action),
        None => error.client_message(),
    }
}

/// One row of the candidate listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingEntry {
    pub name: String,
    pub size: String,
    pub oversized: bool,
}

pub fn listing(intake: &Intake) -> Vec<ListingEntry> {
    let validator = intake.validator();
    intake
        .files()
        .iter()
        .map(|file| ListingEntry {
            name: file.name.clone(),
            size: file.display_size(),
            oversized: validator.is_oversized(file),
        })
        .collect()
}

/// Render the candidate listing the way the upload command prints it.
pub fn format_listing(intake: &Intake) -> Vec<String> {
    let mut lines = vec![intake.files().selection_label()];
    lines.extend(listing(intake).into_iter().map(|entry| {
        if entry.oversized {
            format!("  {} ({}) - over the limit", entry.name, entry.size)
        } else {
            format!("  {} ({})", entry.name, entry.size)
        }
    }));
    lines
}

/// Stat every path into a candidate, in the order given.
pub async fn load_candidates(paths: &[PathBuf]) -> anyhow::Result<Vec<FileCandidate>> {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let file = FileCandidate::from_path(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        files.push(file);
    }
    Ok(files)
}

/// Initialize tracing for the CLI. Logs go to stderr.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use smartship_core::{FileIntakeValidator, FileSource};

    fn file(name: &str, size_bytes: u64) -> FileCandidate {
        FileCandidate {
            name: name.to_string(),
            size_bytes,
            mime_type: "application/octet-stream".to_string(),
            raw: FileSource::Path(name.into()),
        }
    }

    const MB: u64 = 1024 * 1024;

    #[test]
    fn format_notification_tags_level() {
        assert_eq!(
            format_notification(&Notification::success("Upload succeeded!")),
            "[ok] Upload succeeded!"
        );
        assert_eq!(
            format_notification(&Notification::error("disk full")),
            "[error] disk full"
        );
    }

    #[test]
    fn describe_error_adds_hint() {
        assert_eq!(
            describe_error(&ShipError::SessionUnavailable("status 503".to_string())),
            "Failed to connect to the server\n  hint: Refresh the session and try again"
        );
        let io = ShipError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(describe_error(&io), "Failed to read file: gone");
    }

    #[test]
    fn listing_marks_oversized() {
        let mut intake = Intake::new(FileIntakeValidator::new(20 * MB));
        intake.add(vec![file("A", 5 * MB), file("B", 25 * MB)]);

        assert_eq!(
            format_listing(&intake),
            vec![
                "2 file(s) selected".to_string(),
                "  A (5.00 MB)".to_string(),
                "  B (25.00 MB) - over the limit".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn load_candidates_reports_missing_path() {
        let err = load_candidates(&[PathBuf::from("/nonexistent/smartship/x.png")])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("x.png"));
    }
}
