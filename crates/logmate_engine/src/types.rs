use std::fmt;

use logmate_core::{TaskId, UploadItem, UploadStatus};
use thiserror::Error;

/// Lifecycle notifications emitted by the scheduler while a batch runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    /// Items in dispatch order, all `Queued`.
    BatchPlanned { items: Vec<UploadItem> },
    ItemStatus {
        index: usize,
        status: UploadStatus,
        message: Option<String>,
    },
    /// The service acknowledged the file and assigned it a task id.
    Accepted {
        index: usize,
        task_id: TaskId,
        file_name: String,
    },
    /// The batch-wide token fetch failed; no file was sent.
    BatchAborted { message: String },
    /// Every dispatched upload has settled.
    BatchSettled,
}

/// Final state of a batch once every upload has settled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Items in dispatch order with their terminal status.
    pub items: Vec<UploadItem>,
    pub accepted: Vec<(TaskId, String)>,
}

impl BatchReport {
    pub fn failed_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.status == UploadStatus::Error)
            .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct UploadError {
    pub kind: FailureKind,
    pub message: String,
}

impl UploadError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    FileTooLarge { max_bytes: u64, actual: u64 },
    HttpStatus(u16),
    Timeout,
    Network,
    Io,
    InvalidResponse,
    /// The configured endpoint cannot be turned into a url.
    InvalidEndpoint,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::FileTooLarge { max_bytes, actual } => {
                write!(f, "file too large (max {max_bytes}, actual {actual})")
            }
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Io => write!(f, "io error"),
            FailureKind::InvalidResponse => write!(f, "invalid response"),
            FailureKind::InvalidEndpoint => write!(f, "invalid endpoint"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("could not obtain anti-forgery token: {0}")]
    Auth(UploadError),
}

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("invalid stream url: {0}")]
    InvalidUrl(String),
    #[error("could not connect to status stream: {0}")]
    Connect(#[source] tokio_tungstenite::tungstenite::Error),
    #[error("status stream failed: {0}")]
    Closed(#[source] tokio_tungstenite::tungstenite::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("reconciler has stopped")]
    Stopped,
}
