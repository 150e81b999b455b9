use crate::{FileHandle, TaskId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Hand the files to the upload scheduler.
    SubmitBatch { files: Vec<FileHandle> },
    /// Blocking, user-facing interruption (batch-wide failures only).
    Alert { message: String },
    /// A finished task was selected; downstream consumers may render or export it.
    TaskSelected { task_id: TaskId },
}
