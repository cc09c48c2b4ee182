//! User-visible notifications.
//!
//! Components report outcomes through a [`Notifier`]; the front end decides how to
//! show them (toast, terminal line, log entry).

use std::sync::{Mutex, PoisonError};

use smartship_core::{Notification, NotificationLevel};

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Info => tracing::info!(text = %notification.message, "notification"),
            NotificationLevel::Success => {
                tracing::info!(text = %notification.message, "notification (success)")
            }
            NotificationLevel::Error => {
                tracing::warn!(text = %notification.message, "notification (error)")
            }
        }
    }
}

/// Queues notifications until the presentation layer drains them.
#[derive(Debug, Default)]
pub struct NotificationLog {
    entries: Mutex<Vec<Notification>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every queued notification, oldest first.
    pub fn drain(&self) -> Vec<Notification> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *entries)
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for NotificationLog {
    fn notify(&self, notification: Notification) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}
