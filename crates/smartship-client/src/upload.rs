//! Upload orchestration: `Idle -> Sending -> {Succeeded, Failed} -> Idle`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use smartship_core::{
    log_error, ErrorMetadata, FileCandidate, Intake, Notification, ShipError, UploadPhase,
    UploadSession, UploadTask,
};

use crate::api::{TransferCallback, UploadBackend};
use crate::error::BackendError;
use crate::notify::Notifier;
use crate::progress::UploadReporter;

const SENDING_MESSAGE: &str = "Uploading files...";
const SUCCESS_MESSAGE: &str = "Upload succeeded!";
const BUSY_MESSAGE: &str = "An upload is already in progress";
/// Non-success status without an `error` body.
const UPLOAD_FAILED_MESSAGE: &str = "Upload failed";
/// The request never got a status back.
const SEND_ERROR_MESSAGE: &str = "Error while sending files";

/// Message shown for a failed transmission. Server detail wins when present.
fn failure_message(err: &BackendError) -> String {
    match err {
        BackendError::Status {
            message: Some(message),
            ..
        } => message.clone(),
        BackendError::Status { .. } => UPLOAD_FAILED_MESSAGE.to_string(),
        _ => SEND_ERROR_MESSAGE.to_string(),
    }
}

#[derive(Debug)]
struct TaskState {
    task: UploadTask,
    /// When the current terminal outcome was reached.
    finished_at: Option<Instant>,
}

fn lock_state(state: &Mutex<TaskState>) -> MutexGuard<'_, TaskState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Drives one submission at a time from the intake set to the backend.
///
/// There is no automatic retry and no cancellation: a submission runs until the
/// backend answers or the transport fails, and the candidate set is cleared either
/// way. The orchestrator can be shared; [`task`](Self::task) reflects live progress
/// while a submission is in flight.
pub struct UploadOrchestrator {
    backend: Arc<dyn UploadBackend>,
    notifier: Arc<dyn Notifier>,
    result_display: Duration,
    state: Arc<Mutex<TaskState>>,
}

impl UploadOrchestrator {
    pub fn new(
        backend: Arc<dyn UploadBackend>,
        notifier: Arc<dyn Notifier>,
        result_display: Duration,
    ) -> Self {
        Self {
            backend,
            notifier,
            result_display,
            state: Arc::new(Mutex::new(TaskState {
                task: UploadTask::idle(),
                finished_at: None,
            })),
        }
    }

    /// Current task. A terminal outcome reads as Idle once it has been on display
    /// for the configured delay.
    pub fn task(&self) -> UploadTask {
        let state = lock_state(&self.state);
        let expired = state
            .finished_at
            .is_some_and(|at| at.elapsed() >= self.result_display);
        if state.task.phase.is_terminal() && expired {
            UploadTask::idle()
        } else {
            state.task.clone()
        }
    }

    /// Send every non-oversized candidate to the session's upload endpoint.
    ///
    /// Preconditions are checked before anything is sent: without an eligible file
    /// this fails with [`ShipError::NoEligibleFiles`], without a session with
    /// [`ShipError::NoSession`], and the task stays Idle with the set untouched.
    /// A submit while another one is still sending is rejected the same way.
    ///
    /// Once sending starts, progress and exactly one terminal event go to `reporter`,
    /// the task's percent follows the delivered ticks, and the candidate set is
    /// cleared on success and on failure alike.
    pub async fn submit(
        &self,
        session: Option<&UploadSession>,
        intake: &mut Intake,
        reporter: UploadReporter,
    ) -> Result<UploadTask, ShipError> {
        let files: Vec<FileCandidate> = intake.eligible().into_iter().cloned().collect();
        let ready = if files.is_empty() {
            Err(ShipError::NoEligibleFiles)
        } else {
            session.ok_or(ShipError::NoSession)
        };

        // Busy check and claim share one lock.
        let busy = {
            let mut state = lock_state(&self.state);
            if state.task.phase == UploadPhase::Sending {
                true
            } else {
                state.task = if ready.is_ok() {
                    UploadTask::sending()
                } else {
                    UploadTask::idle()
                };
                state.finished_at = None;
                false
            }
        };
        if busy {
            return Err(self.reject(ShipError::InvalidInput(BUSY_MESSAGE.to_string())));
        }
        let session = ready.map_err(|e| self.reject(e))?;

        let total_bytes: u64 = files.iter().map(|f| f.size_bytes).sum();
        let skipped = intake.files().len() - files.len();

        tracing::info!(
            session_id = %session.id(),
            file_count = files.len(),
            skipped,
            total_bytes,
            "Starting upload"
        );
        self.notifier.notify(Notification::info(SENDING_MESSAGE));
        reporter.started(files.len(), total_bytes);

        let on_progress: TransferCallback = {
            let reporter = reporter.clone();
            let state = Arc::clone(&self.state);
            Arc::new(move |progress| {
                if reporter.transferred(progress) {
                    let mut state = lock_state(&state);
                    if state.task.phase == UploadPhase::Sending {
                        state.task.percent = state.task.percent.max(reporter.last_percent());
                    }
                }
            })
        };
        let result = self
            .backend
            .upload_files(session.id(), &files, on_progress)
            .await;

        intake.clear();

        match result {
            Ok(()) => {
                tracing::info!(
                    session_id = %session.id(),
                    file_count = files.len(),
                    "Upload succeeded"
                );
                let task = UploadTask::succeeded();
                self.finish(task.clone());
                reporter.succeed();
                self.notifier.notify(Notification::success(SUCCESS_MESSAGE));
                Ok(task)
            }
            Err(e) => {
                let message = failure_message(&e);
                tracing::debug!(
                    session_id = %session.id(),
                    status = ?e.status(),
                    error = %e,
                    "Upload request failed"
                );
                let err = ShipError::TransmissionFailed(message.clone());
                log_error(&err, "Upload failed");
                self.finish(UploadTask::failed(message.clone()));
                reporter.fail(message.clone());
                self.notifier.notify(Notification::error(message));
                Err(err)
            }
        }
    }

    fn finish(&self, task: UploadTask) {
        let mut state = lock_state(&self.state);
        state.task = task;
        state.finished_at = Some(Instant::now());
    }

    fn reject(&self, err: ShipError) -> ShipError {
        log_error(&err, "Upload not started");
        self.notifier.notify(Notification::error(err.client_message()));
        err
    }
}
