//! Upload session acquisition and refresh.

use std::sync::Arc;

use smartship_core::{log_error, ErrorMetadata, Notification, ShipError, UploadSession};
use tokio::sync::watch;

use crate::api::UploadBackend;
use crate::notify::Notifier;

/// Everything the presentation layer shows about the session. Replaced wholesale on
/// every change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub session: Option<UploadSession>,
    /// A fetch is in flight.
    pub loading: bool,
    /// The most recent fetch failed; `session`, if any, predates it.
    pub last_refresh_failed: bool,
    in_flight: usize,
}

impl SessionSnapshot {
    /// The held session, but only if the last refresh did not fail.
    pub fn fresh_session(&self) -> Option<&UploadSession> {
        if self.last_refresh_failed {
            None
        } else {
            self.session.as_ref()
        }
    }
}

/// Holds the current upload session and refreshes it from the backend.
///
/// Refreshes are not serialized: several may be in flight at once and whichever
/// response lands last decides the held session.
pub struct SessionManager {
    backend: Arc<dyn UploadBackend>,
    notifier: Arc<dyn Notifier>,
    state: watch::Sender<SessionSnapshot>,
}

impl SessionManager {
    pub fn new(backend: Arc<dyn UploadBackend>, notifier: Arc<dyn Notifier>) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::default());
        Self {
            backend,
            notifier,
            state,
        }
    }

    /// Fetch the first session at startup.
    pub async fn acquire(&self) -> Result<UploadSession, ShipError> {
        self.refresh().await
    }

    /// Fetch a new session, replacing the held one on success.
    ///
    /// On failure the held session is kept, `last_refresh_failed` is set and an error
    /// notification is emitted.
    pub async fn refresh(&self) -> Result<UploadSession, ShipError> {
        self.state.send_modify(|s| {
            s.in_flight += 1;
            s.loading = true;
        });

        let result = match self.backend.fetch_session().await {
            Ok(descriptor) => UploadSession::try_from(descriptor),
            Err(e) => Err(ShipError::SessionUnavailable(e.to_string())),
        };

        self.state.send_modify(|s| {
            s.in_flight = s.in_flight.saturating_sub(1);
            s.loading = s.in_flight > 0;
            match &result {
                Ok(session) => {
                    s.session = Some(session.clone());
                    s.last_refresh_failed = false;
                }
                Err(_) => s.last_refresh_failed = true,
            }
        });

        match &result {
            Ok(session) => {
                tracing::info!(session_id = %session.id(), url = %session.url(), "Upload session acquired");
            }
            Err(e) => {
                log_error(e, "Failed to fetch upload session");
                self.notifier.notify(Notification::error(e.client_message()));
            }
        }

        result
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn current(&self) -> Option<UploadSession> {
        self.state.borrow().session.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Watch snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }
}
