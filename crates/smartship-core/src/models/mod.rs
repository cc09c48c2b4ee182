//! Data models for the upload pipeline
//!
//! Each sub-module covers one piece of client state. All of them are plain owned
//! values: components replace them wholesale rather than mutating shared state.

mod file;
mod notification;
mod preview;
mod session;
mod task;

pub use file::{CandidateSet, FileCandidate, FileSource};
pub use notification::{Notification, NotificationLevel};
pub use preview::PreviewKind;
pub use session::{session_id_from_url, SessionDescriptor, UploadSession};
pub use task::{UploadPhase, UploadTask};
