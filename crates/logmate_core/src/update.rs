use engine_logging::{engine_debug, engine_warn};

use crate::{AppState, ApplyOutcome, Effect, Msg, TaskStatus};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FilesSubmitted(files) => {
            if files.is_empty() {
                return (state, Vec::new());
            }
            if state.is_uploading() {
                engine_debug!("ignoring {} files while a batch is running", files.len());
                return (state, Vec::new());
            }
            state.begin_batch();
            vec![Effect::SubmitBatch { files }]
        }
        Msg::BatchPlanned(items) => {
            state.set_uploads(items);
            Vec::new()
        }
        Msg::UploadStatusChanged {
            index,
            status,
            message,
        } => {
            if !state.set_upload_status(index, status, message) {
                engine_warn!("upload status for unknown batch slot {}", index);
            }
            Vec::new()
        }
        Msg::TaskAccepted {
            task_id,
            file_name,
            at,
        } => {
            if state.tasks_mut().register(task_id, file_name, at) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::BatchAborted { message } => {
            state.finish_batch(Some(message.clone()));
            vec![Effect::Alert { message }]
        }
        Msg::BatchSettled => {
            state.finish_batch(None);
            Vec::new()
        }
        Msg::Stream { event, at } => {
            if state.tasks_mut().apply(event, at) != ApplyOutcome::Ignored {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::TaskClicked { task_id } => {
            let status = state.task(&task_id).map(|record| record.status);
            if status == Some(TaskStatus::Complete) {
                state.select(task_id.clone());
                vec![Effect::TaskSelected { task_id }]
            } else {
                Vec::new()
            }
        }
        Msg::Tick => {
            // Remaining-time labels drift with the clock even without events.
            if state.tasks().iter().any(|r| r.status == TaskStatus::Processing) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}
