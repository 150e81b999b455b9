use crate::eta::{estimate_remaining_seconds, format_remaining, processing_seconds};
use crate::ordering::sorted_for_display;
use crate::view_model::{AppViewModel, TaskRowView, UploadRowView, ETA_PENDING};
use crate::{TaskId, TaskRecord, TaskStatus, TaskStore, Timestamp, UploadItem, UploadStatus};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    tasks: TaskStore,
    uploads: Vec<UploadItem>,
    uploading: bool,
    alert: Option<String>,
    selected: Option<TaskId>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    pub fn task(&self, id: &TaskId) -> Option<&TaskRecord> {
        self.tasks.get(id)
    }

    pub fn uploads(&self) -> &[UploadItem] {
        &self.uploads
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    pub fn view(&self, now: Timestamp) -> AppViewModel {
        let tasks: Vec<TaskRowView> = sorted_for_display(self.tasks.iter())
            .into_iter()
            .map(|record| task_row(record, now))
            .collect();
        let completed_count = tasks
            .iter()
            .filter(|row| row.status == TaskStatus::Complete)
            .count();

        AppViewModel {
            uploading: self.uploading,
            alert: self.alert.clone(),
            uploads: self
                .uploads
                .iter()
                .map(|item| UploadRowView {
                    name: item.file.name.clone(),
                    size_bytes: item.file.size_bytes,
                    status: item.status,
                    message: item.message.clone(),
                })
                .collect(),
            task_count: tasks.len(),
            completed_count,
            tasks,
            selected: self.selected.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn tasks_mut(&mut self) -> &mut TaskStore {
        &mut self.tasks
    }

    pub(crate) fn begin_batch(&mut self) {
        self.uploading = true;
        self.alert = None;
        self.uploads.clear();
        self.mark_dirty();
    }

    pub(crate) fn set_uploads(&mut self, items: Vec<UploadItem>) {
        self.uploads = items;
        self.mark_dirty();
    }

    pub(crate) fn set_upload_status(
        &mut self,
        index: usize,
        status: UploadStatus,
        message: Option<String>,
    ) -> bool {
        let Some(item) = self.uploads.get_mut(index) else {
            return false;
        };
        item.status = status;
        item.message = message;
        self.mark_dirty();
        true
    }

    pub(crate) fn finish_batch(&mut self, alert: Option<String>) {
        self.uploading = false;
        if alert.is_some() {
            self.alert = alert;
        }
        self.mark_dirty();
    }

    pub(crate) fn select(&mut self, task_id: TaskId) {
        self.selected = Some(task_id);
        self.mark_dirty();
    }
}

fn task_row(record: &TaskRecord, now: Timestamp) -> TaskRowView {
    let eta_seconds = estimate_remaining_seconds(record, now);
    TaskRowView {
        task_id: record.id.clone(),
        file_name: record.file_name.clone(),
        status: record.status,
        progress: record.progress,
        current_chunk: record.current_chunk,
        total_chunks: record.total_chunks,
        processed_count: record.processed_count,
        total_lines: record.total_lines,
        eta_seconds,
        eta_label: eta_seconds
            .map(format_remaining)
            .unwrap_or_else(|| ETA_PENDING.to_string()),
        processing_secs: processing_seconds(record),
        error: record.error.clone(),
    }
}
