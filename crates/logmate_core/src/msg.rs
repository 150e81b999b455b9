use crate::{FileHandle, StreamEvent, TaskId, Timestamp, UploadItem, UploadStatus};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User picked files for analysis.
    FilesSubmitted(Vec<FileHandle>),
    /// Scheduler ordered the batch; items are listed in dispatch order.
    BatchPlanned(Vec<UploadItem>),
    /// One item of the running batch moved through its lifecycle.
    UploadStatusChanged {
        index: usize,
        status: UploadStatus,
        message: Option<String>,
    },
    /// The service acknowledged an upload and assigned it a task id.
    TaskAccepted {
        task_id: TaskId,
        file_name: String,
        at: Timestamp,
    },
    /// The batch-wide token fetch failed; nothing was submitted.
    BatchAborted { message: String },
    /// Every dispatched upload of the batch has settled.
    BatchSettled,
    /// Status event received on the streaming channel.
    Stream { event: StreamEvent, at: Timestamp },
    /// User picked a task from the list.
    TaskClicked { task_id: TaskId },
    /// Render tick; keeps the ETA column fresh.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
