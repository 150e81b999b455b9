use std::collections::HashMap;

use engine_logging::{engine_debug, engine_trace};

use crate::event::{ChunkProgress, StreamEvent};
use crate::task::{TaskId, TaskRecord, TaskStatus, Timestamp, DEFAULT_TOTAL_CHUNKS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// An existing record was replaced with its updated version.
    Updated,
    /// The event addressed an unknown task and a record was created for it.
    Created,
    /// The event left the store untouched.
    Ignored,
}

/// Authoritative mapping from task id to observed job state.
///
/// Records keep their insertion order, which is the final tiebreak of the
/// display ordering. Every mutation is a single synchronous step; callers are
/// expected to funnel all writes through one owner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskStore {
    records: Vec<TaskRecord>,
    index: HashMap<TaskId, usize>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &TaskId) -> Option<&TaskRecord> {
        self.index.get(id).map(|&slot| &self.records[slot])
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.index.contains_key(id)
    }

    /// Records in the order they first appeared.
    pub fn iter(&self) -> impl Iterator<Item = &TaskRecord> {
        self.records.iter()
    }

    pub fn records(&self) -> &[TaskRecord] {
        &self.records
    }

    /// True when every known task has reached `complete` or `error`.
    pub fn all_settled(&self) -> bool {
        self.records.iter().all(|record| record.status.is_terminal())
    }

    /// Inserts a placeholder for a freshly accepted upload. Idempotent: a
    /// known id is left untouched and `false` is returned.
    pub fn register(&mut self, id: TaskId, file_name: impl Into<String>, now: Timestamp) -> bool {
        if self.contains(&id) {
            engine_trace!("register ignored for known task {}", id);
            return false;
        }
        self.insert(TaskRecord::placeholder(id, file_name, now));
        true
    }

    pub fn apply(&mut self, event: StreamEvent, now: Timestamp) -> ApplyOutcome {
        match event {
            StreamEvent::Start {
                task_id,
                file_name,
                total_lines,
                total_chunks,
            } => self.update_existing(&task_id, |record| {
                if record.is_complete() {
                    return false;
                }
                if let Some(name) = file_name {
                    record.file_name = name;
                }
                if let Some(total) = total_lines {
                    record.total_lines = total;
                }
                if let Some(chunks) = total_chunks.filter(|&chunks| chunks > 0) {
                    record.total_chunks = chunks;
                }
                record.last_updated = now;
                true
            }),
            StreamEvent::Chunk(chunk) => {
                if self.contains(&chunk.task_id) {
                    let task_id = chunk.task_id.clone();
                    self.update_existing(&task_id, |record| {
                        if record.is_complete() {
                            return false;
                        }
                        record.current_chunk = chunk.chunk_index;
                        record.total_chunks = chunk.total_chunks;
                        record.processed_count = chunk.processed_count;
                        record.total_lines = chunk.total_lines;
                        record.recompute_progress();
                        record.last_updated = now;
                        true
                    })
                } else {
                    self.insert(record_from_chunk(chunk, now));
                    ApplyOutcome::Created
                }
            }
            StreamEvent::Complete {
                task_id,
                file_name,
                result,
            } => {
                if self.contains(&task_id) {
                    self.update_existing(&task_id, |record| {
                        record.mark_complete(result, now);
                        true
                    })
                } else {
                    let name = file_name.unwrap_or_else(|| task_id.placeholder_name());
                    let mut record = TaskRecord::placeholder(task_id, name, now);
                    record.mark_complete(result, now);
                    self.insert(record);
                    ApplyOutcome::Created
                }
            }
            StreamEvent::Error { task_id, message } => {
                if !self.contains(&task_id) {
                    engine_debug!("dropping ERROR for unknown task {}: {}", task_id, message);
                    return ApplyOutcome::Ignored;
                }
                self.update_existing(&task_id, |record| {
                    if record.is_complete() {
                        return false;
                    }
                    record.error = Some(message);
                    record.status = TaskStatus::Error;
                    record.last_updated = now;
                    true
                })
            }
        }
    }

    fn insert(&mut self, record: TaskRecord) {
        self.index.insert(record.id.clone(), self.records.len());
        self.records.push(record);
    }

    /// Builds the next version of one record and swaps it in whole; `edit`
    /// returns `false` to discard the change.
    fn update_existing<F>(&mut self, id: &TaskId, edit: F) -> ApplyOutcome
    where
        F: FnOnce(&mut TaskRecord) -> bool,
    {
        let Some(&slot) = self.index.get(id) else {
            return ApplyOutcome::Ignored;
        };
        let mut next = self.records[slot].clone();
        if edit(&mut next) {
            self.records[slot] = next;
            ApplyOutcome::Updated
        } else {
            engine_trace!("event for settled task {} ignored", id);
            ApplyOutcome::Ignored
        }
    }
}

fn record_from_chunk(chunk: ChunkProgress, now: Timestamp) -> TaskRecord {
    let name = chunk
        .file_name
        .unwrap_or_else(|| chunk.task_id.placeholder_name());
    let mut record = TaskRecord::placeholder(chunk.task_id, name, now);
    record.current_chunk = chunk.chunk_index;
    record.total_chunks = if chunk.total_chunks == 0 {
        DEFAULT_TOTAL_CHUNKS
    } else {
        chunk.total_chunks
    };
    record.processed_count = chunk.processed_count;
    record.total_lines = chunk.total_lines;
    record.recompute_progress();
    record
}
