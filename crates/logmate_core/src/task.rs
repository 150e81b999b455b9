use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Timestamp = DateTime<Utc>;

/// Chunk count assumed for a freshly registered task until the service reports one.
pub const DEFAULT_TOTAL_CHUNKS: u32 = 5;

/// Opaque correlation key assigned by the analysis service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display name used when the service never told us the file name.
    pub fn placeholder_name(&self) -> String {
        let short: String = self.0.chars().take(8).collect();
        format!("Task-{short}")
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Processing,
    Complete,
    Error,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Complete | TaskStatus::Error)
    }
}

/// Observed state of one remote analysis job.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: TaskId,
    pub file_name: String,
    pub status: TaskStatus,
    pub progress: f64,
    pub processed_count: u64,
    pub total_lines: u64,
    pub current_chunk: u32,
    pub total_chunks: u32,
    pub error: Option<String>,
    pub result: Option<serde_json::Value>,
    pub started_at: Timestamp,
    pub last_updated: Timestamp,
    pub completed_at: Option<Timestamp>,
}

impl TaskRecord {
    /// Placeholder for a job we just submitted and have not heard about yet.
    pub fn placeholder(id: TaskId, file_name: impl Into<String>, now: Timestamp) -> Self {
        Self {
            id,
            file_name: file_name.into(),
            status: TaskStatus::Processing,
            progress: 0.0,
            processed_count: 0,
            total_lines: 0,
            current_chunk: 0,
            total_chunks: DEFAULT_TOTAL_CHUNKS,
            error: None,
            result: None,
            started_at: now,
            last_updated: now,
            completed_at: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == TaskStatus::Complete
    }

    /// Recomputes `progress` from the line counters; leaves it alone when
    /// the total is still unknown.
    pub(crate) fn recompute_progress(&mut self) {
        if self.total_lines == 0 {
            return;
        }
        let ratio = self.processed_count as f64 / self.total_lines as f64;
        self.progress = (ratio * 100.0).clamp(0.0, 100.0);
    }

    pub(crate) fn mark_complete(&mut self, result: Option<serde_json::Value>, now: Timestamp) {
        self.progress = 100.0;
        self.result = result;
        self.status = TaskStatus::Complete;
        self.completed_at.get_or_insert(now);
        self.last_updated = now;
    }
}
