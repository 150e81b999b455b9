use chrono::{Duration, TimeZone, Utc};
use logmate_core::{
    plan_batch, update, AppState, ChunkProgress, Effect, FileHandle, Msg, StreamEvent, TaskId,
    TaskStatus, Timestamp, UploadStatus, ETA_PENDING,
};
use pretty_assertions::assert_eq;

const MB: u64 = 1024 * 1024;

fn at(secs: i64) -> Timestamp {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap() + Duration::seconds(secs)
}

fn files() -> Vec<FileHandle> {
    vec![
        FileHandle::new("/logs/ten.log", "ten.log", 10 * MB),
        FileHandle::new("/logs/two.log", "two.log", 2 * MB),
        FileHandle::new("/logs/fifty.log", "fifty.log", 50 * MB),
    ]
}

fn accept(state: AppState, id: &str, name: &str, secs: i64) -> AppState {
    update(
        state,
        Msg::TaskAccepted {
            task_id: TaskId::new(id),
            file_name: name.to_string(),
            at: at(secs),
        },
    )
    .0
}

#[test]
fn files_submitted_starts_batch_and_emits_submit_effect() {
    let (mut state, effects) = update(AppState::new(), Msg::FilesSubmitted(files()));

    assert!(state.is_uploading());
    assert!(state.consume_dirty());
    assert_eq!(effects, vec![Effect::SubmitBatch { files: files() }]);

    // A second drop while the first batch runs is ignored.
    let (state, effects) = update(state, Msg::FilesSubmitted(files()));
    assert!(effects.is_empty());
    assert!(state.is_uploading());
}

#[test]
fn batch_lifecycle_is_visible_incrementally() {
    let (state, _) = update(AppState::new(), Msg::FilesSubmitted(files()));
    let (state, _) = update(state, Msg::BatchPlanned(plan_batch(files())));

    let names: Vec<_> = state.view(at(0)).uploads.into_iter().map(|u| u.name).collect();
    assert_eq!(names, vec!["two.log", "ten.log", "fifty.log"]);

    let (state, _) = update(
        state,
        Msg::UploadStatusChanged {
            index: 0,
            status: UploadStatus::Uploading,
            message: None,
        },
    );
    let (state, _) = update(
        state,
        Msg::UploadStatusChanged {
            index: 2,
            status: UploadStatus::Error,
            message: Some("http status 500".to_string()),
        },
    );
    let view = state.view(at(0));
    assert_eq!(view.uploads[0].status, UploadStatus::Uploading);
    assert_eq!(view.uploads[1].status, UploadStatus::Queued);
    assert_eq!(view.uploads[2].status, UploadStatus::Error);
    assert_eq!(view.uploads[2].message.as_deref(), Some("http status 500"));
    assert!(view.uploading);

    let (state, _) = update(state, Msg::BatchSettled);
    assert!(!state.view(at(0)).uploading);
}

#[test]
fn batch_abort_raises_single_alert() {
    let (state, _) = update(AppState::new(), Msg::FilesSubmitted(files()));
    let (state, effects) = update(
        state,
        Msg::BatchAborted {
            message: "anti-forgery token request failed".to_string(),
        },
    );

    assert_eq!(
        effects,
        vec![Effect::Alert {
            message: "anti-forgery token request failed".to_string()
        }]
    );
    let view = state.view(at(0));
    assert!(!view.uploading);
    assert_eq!(
        view.alert.as_deref(),
        Some("anti-forgery token request failed")
    );
    assert_eq!(view.task_count, 0);
}

#[test]
fn accepted_uploads_register_tasks() {
    let state = accept(AppState::new(), "t1", "a.log", 0);
    let (mut state, _) = update(
        state,
        Msg::Stream {
            event: StreamEvent::Chunk(ChunkProgress {
                task_id: TaskId::new("t1"),
                file_name: None,
                chunk_index: 1,
                total_chunks: 5,
                processed_count: 500,
                total_lines: 1000,
            }),
            at: at(10),
        },
    );
    assert!(state.consume_dirty());

    let view = state.view(at(10));
    assert_eq!(view.task_count, 1);
    let row = &view.tasks[0];
    assert_eq!(row.file_name, "a.log");
    assert_eq!(row.progress, 50.0);
    assert_eq!(row.eta_seconds, Some(10));
    assert_eq!(row.eta_label, "10s");
}

#[test]
fn ignored_stream_event_leaves_state_clean() {
    let mut state = AppState::new();
    assert!(!state.consume_dirty());
    let (mut state, _) = update(
        state,
        Msg::Stream {
            event: StreamEvent::Error {
                task_id: TaskId::new("ghost"),
                message: "boom".to_string(),
            },
            at: at(1),
        },
    );
    assert!(!state.consume_dirty());
    assert_eq!(state.view(at(1)).task_count, 0);
}

#[test]
fn task_selection_only_fires_for_complete_tasks() {
    let state = accept(AppState::new(), "done", "done.log", 0);
    let state = accept(state, "busy", "busy.log", 0);
    let (state, _) = update(
        state,
        Msg::Stream {
            event: StreamEvent::Complete {
                task_id: TaskId::new("done"),
                file_name: None,
                result: None,
            },
            at: at(5),
        },
    );

    let (state, effects) = update(
        state,
        Msg::TaskClicked {
            task_id: TaskId::new("busy"),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.view(at(5)).selected, None);

    let (state, effects) = update(
        state,
        Msg::TaskClicked {
            task_id: TaskId::new("done"),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::TaskSelected {
            task_id: TaskId::new("done")
        }]
    );
    let view = state.view(at(5));
    assert_eq!(view.selected, Some(TaskId::new("done")));
    assert_eq!(view.completed_count, 1);
    assert_eq!(view.tasks[0].status, TaskStatus::Complete);
    assert_eq!(view.tasks[1].eta_label, ETA_PENDING);
}

#[test]
fn tick_marks_dirty_only_while_tasks_are_processing() {
    let (mut state, _) = update(AppState::new(), Msg::Tick);
    assert!(!state.consume_dirty());

    let mut state = accept(state, "t1", "a.log", 0);
    assert!(state.consume_dirty());
    let (mut state, _) = update(state, Msg::Tick);
    assert!(state.consume_dirty());
}
