use crate::{TaskId, TaskStatus, UploadStatus};

/// Label shown while the estimator has nothing to extrapolate from.
pub const ETA_PENDING: &str = "Calculating...";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub uploading: bool,
    pub alert: Option<String>,
    pub uploads: Vec<UploadRowView>,
    /// Tasks in presentation order.
    pub tasks: Vec<TaskRowView>,
    pub task_count: usize,
    pub completed_count: usize,
    pub selected: Option<TaskId>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRowView {
    pub name: String,
    pub size_bytes: u64,
    pub status: UploadStatus,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskRowView {
    pub task_id: TaskId,
    pub file_name: String,
    pub status: TaskStatus,
    pub progress: f64,
    pub current_chunk: u32,
    pub total_chunks: u32,
    pub processed_count: u64,
    pub total_lines: u64,
    pub eta_seconds: Option<u64>,
    pub eta_label: String,
    /// Set once the task is complete.
    pub processing_secs: Option<u64>,
    pub error: Option<String>,
}
