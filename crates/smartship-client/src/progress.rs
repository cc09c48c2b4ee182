//! Per-submission event channel.
//!
//! The channel itself enforces the delivery contract: percent values never go down
//! and stay within 0..=100, and exactly one terminal event is delivered, after which
//! nothing else is.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use crate::api::TransferProgress;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    Started { file_count: usize, total_bytes: u64 },
    Progress { percent: u8 },
    Succeeded,
    Failed { message: String },
}

impl UploadEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadEvent::Succeeded | UploadEvent::Failed { .. })
    }
}

/// `round(transferred / total * 100)`, clamped to 100. `None` when the total is
/// unknown or zero.
pub fn percent_of(transferred: u64, total: Option<u64>) -> Option<u8> {
    let total = total.filter(|t| *t > 0)? as u128;
    let transferred = transferred as u128;
    let rounded = (transferred * 200 + total) / (total * 2);
    Some(rounded.min(100) as u8)
}

#[derive(Debug, Default)]
struct ReporterState {
    last_percent: Option<u8>,
    finished: bool,
}

/// Sending half of the channel. Cheap to clone; every clone shares the same ordering
/// state.
///
/// The ordering checks and the send happen under one lock, so a tick racing the
/// terminal event from another thread can never land after it.
#[derive(Debug, Clone)]
pub struct UploadReporter {
    tx: Option<mpsc::UnboundedSender<UploadEvent>>,
    state: Arc<Mutex<ReporterState>>,
}

/// Receiving half of the channel.
#[derive(Debug)]
pub struct UploadEvents {
    rx: mpsc::UnboundedReceiver<UploadEvent>,
}

/// Open a channel for one submission.
pub fn channel() -> (UploadReporter, UploadEvents) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        UploadReporter {
            tx: Some(tx),
            state: Arc::default(),
        },
        UploadEvents { rx },
    )
}

impl UploadReporter {
    /// A reporter nobody listens to. Ordering state is still tracked.
    pub fn detached() -> Self {
        Self {
            tx: None,
            state: Arc::default(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ReporterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn send(&self, event: UploadEvent) {
        if let Some(tx) = &self.tx {
            // A dropped receiver just means nobody is watching any more.
            let _ = tx.send(event);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.lock().finished
    }

    pub fn started(&self, file_count: usize, total_bytes: u64) {
        let state = self.lock();
        if !state.finished {
            self.send(UploadEvent::Started {
                file_count,
                total_bytes,
            });
        }
    }

    /// Report a percent value. Returns whether it was delivered: values that do not
    /// increase on the last one, and anything after the terminal event, are dropped.
    pub fn progress(&self, percent: u8) -> bool {
        let percent = percent.min(100);
        let mut state = self.lock();
        if state.finished || state.last_percent.is_some_and(|last| last >= percent) {
            return false;
        }
        state.last_percent = Some(percent);
        self.send(UploadEvent::Progress { percent });
        true
    }

    /// Translate a byte count into a percent tick. No tick is produced when the total
    /// size is unknown.
    pub fn transferred(&self, progress: TransferProgress) -> bool {
        match percent_of(progress.transferred, progress.total) {
            Some(percent) => self.progress(percent),
            None => false,
        }
    }

    /// Last percent delivered, 0 if none.
    pub fn last_percent(&self) -> u8 {
        self.lock().last_percent.unwrap_or(0)
    }

    pub fn succeed(&self) -> bool {
        self.finish(UploadEvent::Succeeded)
    }

    pub fn fail(&self, message: impl Into<String>) -> bool {
        self.finish(UploadEvent::Failed {
            message: message.into(),
        })
    }

    fn finish(&self, event: UploadEvent) -> bool {
        let mut state = self.lock();
        if state.finished {
            return false;
        }
        state.finished = true;
        self.send(event);
        true
    }
}

impl UploadEvents {
    /// Next event, or `None` once every reporter clone is gone and the queue is empty.
    pub async fn next(&mut self) -> Option<UploadEvent> {
        self.rx.recv().await
    }

    /// Drain whatever is queued right now.
    pub fn drain(&mut self) -> Vec<UploadEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }
}
