//! HTTP client and upload pipeline for the smartship backend.
//!
//! [`ApiClient`] speaks the two backend contracts (`GET /session-url` and
//! `POST /upload/{session_id}`). On top of it sit the stateful components:
//! [`session::SessionManager`], [`upload::UploadOrchestrator`] and
//! [`preview::PreviewResolver`]. The CLI drives these directly.

pub mod api;
pub mod error;
pub mod notify;
pub mod preview;
pub mod progress;
pub mod session;
pub mod upload;

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use smartship_core::ClientConfig;

pub use api::{TransferCallback, TransferProgress, UploadBackend};
pub use error::{BackendError, BackendResult};
pub use notify::{NotificationLog, Notifier, TracingNotifier};
pub use preview::{ObjectUrl, ObjectUrlRegistry, PreviewResolver, PreviewResource, PreviewSlot};
pub use progress::{UploadEvent, UploadEvents, UploadReporter};
pub use session::{SessionManager, SessionSnapshot};
pub use upload::UploadOrchestrator;

/// Error body the backend may attach to a non-success response.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Pull the `error` field out of a response body, if it has one.
pub(crate) fn error_message_from_body(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|b| b.error)
}

/// HTTP client bound to one backend base URL.
///
/// Cookies set by the backend are kept and replayed, which is how the session
/// credential travels between the session fetch and the upload.
///
/// `timeout` bounds connecting and every [`get`](Self::get). Uploads are only bounded
/// by the connect phase, since a large multipart body on a slow link can take
/// arbitrarily long.
#[derive(Clone, Debug)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> BackendResult<Self> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .cookie_store(true)
            .build()
            .map_err(BackendError::Client)?;

        let base_url: String = base_url.into();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &ClientConfig) -> BackendResult<Self> {
        Self::new(config.base_url.clone(), config.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET request. Deserializes JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> BackendResult<T> {
        let url = self.build_url(path);
        let response = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(BackendError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Status {
                status: status.as_u16(),
                message: error_message_from_body(&body),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }

    /// Raw client for custom requests.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ApiClient::new("http://localhost:3000/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000");
        assert_eq!(
            client.build_url("/session-url"),
            "http://localhost:3000/session-url"
        );
    }

    #[test]
    fn test_error_message_from_body() {
        assert_eq!(
            error_message_from_body(r#"{"error":"disk full"}"#),
            Some("disk full".to_string())
        );
        assert_eq!(error_message_from_body("Internal Server Error"), None);
        assert_eq!(error_message_from_body(r#"{"message":"nope"}"#), None);
        assert_eq!(error_message_from_body(""), None);
    }
}
