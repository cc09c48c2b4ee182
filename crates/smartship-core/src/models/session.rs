use serde::{Deserialize, Serialize};

use crate::error::ShipError;

/// Body of `GET /session-url`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDescriptor {
    pub url: String,
}

/// Backend-issued upload session.
///
/// Only the url is stored. The id is re-derived from it on every call, so a refreshed
/// session can never carry the id of the one it replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSession {
    url: String,
}

impl UploadSession {
    /// Build a session from the url the backend returned.
    ///
    /// Fails with [`ShipError::SessionUnavailable`] when the url has no path segment
    /// to use as the session id.
    pub fn from_url(url: impl Into<String>) -> Result<Self, ShipError> {
        let url = url.into();
        if session_id_from_url(&url).is_none() {
            return Err(ShipError::SessionUnavailable(format!(
                "session url has no id segment: {}",
                url
            )));
        }
        Ok(Self { url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Final path segment of the session url.
    pub fn id(&self) -> &str {
        session_id_from_url(&self.url).unwrap_or_default()
    }
}

impl TryFrom<SessionDescriptor> for UploadSession {
    type Error = ShipError;

    fn try_from(descriptor: SessionDescriptor) -> Result<Self, Self::Error> {
        UploadSession::from_url(descriptor.url)
    }
}

/// Extract the last non-empty path segment of `url`, ignoring query, fragment and a
/// trailing slash. Returns `None` when the url has no path.
pub fn session_id_from_url(url: &str) -> Option<&str> {
    let end = url.find(|c| c == '?' || c == '#').unwrap_or(url.len());
    let without_query = &url[..end];

    let path = match without_query.find("://") {
        Some(scheme_end) => {
            let rest = &without_query[scheme_end + 3..];
            &rest[rest.find('/')?..]
        }
        None => without_query,
    };

    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
}
