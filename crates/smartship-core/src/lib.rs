//! Smartship Core Library
//!
//! Domain models, error types, configuration and intake validation shared by the
//! upload client and the command-line front end.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::{resolve_base_url, ClientConfig};
pub use error::{log_error, ErrorMetadata, LogLevel, ShipError};
pub use models::{
    CandidateSet, FileCandidate, FileSource, Notification, NotificationLevel, PreviewKind,
    SessionDescriptor, UploadPhase, UploadSession, UploadTask,
};
pub use validation::{Classification, FileIntakeValidator, Intake, IntakeSummary};
