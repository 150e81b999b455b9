//! LogMate core: task model, reconciliation store and the pure state machine.
mod effect;
mod eta;
mod event;
mod msg;
mod ordering;
mod state;
mod store;
mod summary;
mod task;
mod update;
mod upload;
mod view_model;

pub use effect::Effect;
pub use eta::{estimate_remaining_seconds, format_remaining, processing_seconds};
pub use event::{decode_event, ChunkProgress, EventDecodeError, StreamEvent};
pub use msg::Msg;
pub use ordering::{display_order, sorted_for_display};
pub use state::AppState;
pub use store::{ApplyOutcome, TaskStore};
pub use summary::{summarize_result, ResultSummary};
pub use task::{TaskId, TaskRecord, TaskStatus, Timestamp, DEFAULT_TOTAL_CHUNKS};
pub use update::update;
pub use upload::{plan_batch, FileHandle, UploadItem, UploadStatus, MAX_UPLOAD_BYTES};
pub use view_model::{AppViewModel, TaskRowView, UploadRowView, ETA_PENDING};
