//! Error types module
//!
//! Every failure in the upload pipeline is expressed as a [`ShipError`]. None of them
//! is fatal: each one maps to a user-visible message and a well-defined state
//! transition in the component that raised it.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like local precondition failures
    Debug,
    /// Warning level - for recoverable issues like an unreachable backend
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be presented to the user.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "SESSION_UNAVAILABLE")
    fn error_code(&self) -> &'static str;

    /// Suggested action for the user
    fn suggested_action(&self) -> Option<&'static str>;

    /// User-facing message (may differ from the internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum ShipError {
    #[error("Session unavailable: {0}")]
    SessionUnavailable(String),

    #[error("No eligible files: every candidate is missing or over the size limit")]
    NoEligibleFiles,

    #[error("No upload session held")]
    NoSession,

    #[error("Transmission failed: {0}")]
    TransmissionFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Static metadata for each variant: (error_code, suggested_action, log_level).
fn ship_error_static_metadata(err: &ShipError) -> (&'static str, Option<&'static str>, LogLevel) {
    match err {
        ShipError::SessionUnavailable(_) => (
            "SESSION_UNAVAILABLE",
            Some("Refresh the session and try again"),
            LogLevel::Warn,
        ),
        ShipError::NoEligibleFiles => (
            "NO_ELIGIBLE_FILES",
            Some("Select at least one file within the size limit"),
            LogLevel::Debug,
        ),
        ShipError::NoSession => (
            "NO_SESSION",
            Some("Wait for the session to load or refresh it"),
            LogLevel::Debug,
        ),
        ShipError::TransmissionFailed(_) => (
            "TRANSMISSION_FAILED",
            Some("Select the files again and resubmit"),
            LogLevel::Warn,
        ),
        ShipError::InvalidInput(_) => (
            "INVALID_INPUT",
            Some("Check the selected files"),
            LogLevel::Debug,
        ),
        ShipError::Io(_) => ("IO_ERROR", None, LogLevel::Error),
    }
}

impl ErrorMetadata for ShipError {
    fn error_code(&self) -> &'static str {
        ship_error_static_metadata(self).0
    }

    fn suggested_action(&self) -> Option<&'static str> {
        ship_error_static_metadata(self).1
    }

    fn log_level(&self) -> LogLevel {
        ship_error_static_metadata(self).2
    }

    fn client_message(&self) -> String {
        match self {
            ShipError::SessionUnavailable(_) => "Failed to connect to the server".to_string(),
            ShipError::NoEligibleFiles => "No files within the size limit to send".to_string(),
            ShipError::NoSession => "No upload session available yet".to_string(),
            // Server-provided detail is shown verbatim.
            ShipError::TransmissionFailed(ref msg) => msg.clone(),
            ShipError::InvalidInput(ref msg) => msg.clone(),
            ShipError::Io(ref err) => format!("Failed to read file: {}", err),
        }
    }
}

/// Log an error at the level its metadata asks for.
pub fn log_error(error: &ShipError, context: &'static str) {
    let code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => tracing::debug!(error = %error, code, "{}", context),
        LogLevel::Warn => tracing::warn!(error = %error, code, "{}", context),
        LogLevel::Error => tracing::error!(error = %error, code, "{}", context),
    }
}
