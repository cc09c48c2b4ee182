use serde::{Deserialize, Serialize};

/// Upload state machine phase: `Idle -> Sending -> {Succeeded, Failed} -> Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadPhase {
    Idle,
    Sending,
    Succeeded,
    Failed,
}

impl UploadPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, UploadPhase::Succeeded | UploadPhase::Failed)
    }
}

/// State of the current (or last) submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTask {
    pub phase: UploadPhase,
    /// 0..=100
    pub percent: u8,
    pub error_message: Option<String>,
}

impl Default for UploadTask {
    fn default() -> Self {
        Self::idle()
    }
}

impl UploadTask {
    pub fn idle() -> Self {
        Self {
            phase: UploadPhase::Idle,
            percent: 0,
            error_message: None,
        }
    }

    pub fn sending() -> Self {
        Self {
            phase: UploadPhase::Sending,
            ..Self::idle()
        }
    }

    pub fn succeeded() -> Self {
        Self {
            phase: UploadPhase::Succeeded,
            ..Self::idle()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            phase: UploadPhase::Failed,
            percent: 0,
            error_message: Some(message.into()),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.phase == UploadPhase::Idle
    }
}
