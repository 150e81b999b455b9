//! Single-writer owner of the task store.
//!
//! All mutations arrive as commands on one mailbox and are applied in order
//! by a single tokio task, so the upload scheduler and the status stream can
//! both feed the store without locks.
use std::sync::Arc;

use chrono::Utc;
use engine_logging::{engine_debug, engine_warn};
use logmate_core::{
    update, AppState, AppViewModel, Effect, Msg, StreamEvent, TaskId, TaskRecord, Timestamp,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::scheduler::UploadSink;
use crate::{EngineError, UploadEvent};

/// Source of "now" for stamping registrations and events.
pub type Clock = Arc<dyn Fn() -> Timestamp + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

enum Command {
    Dispatch(Msg),
    Snapshot(oneshot::Sender<AppViewModel>),
    Task(TaskId, oneshot::Sender<Option<TaskRecord>>),
    Shutdown,
}

/// Cloneable front door to the reconciler task.
#[derive(Clone)]
pub struct ReconcilerHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
    clock: Clock,
}

impl ReconcilerHandle {
    /// Proposes a placeholder for a freshly accepted upload.
    pub fn register(
        &self,
        task_id: TaskId,
        file_name: impl Into<String>,
    ) -> Result<(), EngineError> {
        self.dispatch(Msg::TaskAccepted {
            task_id,
            file_name: file_name.into(),
            at: (self.clock)(),
        })
    }

    /// Applies one status event, stamped with the time of receipt.
    pub fn apply(&self, event: StreamEvent) -> Result<(), EngineError> {
        self.dispatch(Msg::Stream {
            event,
            at: (self.clock)(),
        })
    }

    pub fn dispatch(&self, msg: Msg) -> Result<(), EngineError> {
        self.cmd_tx
            .send(Command::Dispatch(msg))
            .map_err(|_| EngineError::Stopped)
    }

    /// View at the clock's current time. `dirty` reports whether anything
    /// changed since the previous snapshot.
    pub async fn snapshot(&self) -> Result<AppViewModel, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Snapshot(reply_tx))
            .map_err(|_| EngineError::Stopped)?;
        reply_rx.await.map_err(|_| EngineError::Stopped)
    }

    pub async fn task(&self, task_id: TaskId) -> Result<Option<TaskRecord>, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Task(task_id, reply_tx))
            .map_err(|_| EngineError::Stopped)?;
        reply_rx.await.map_err(|_| EngineError::Stopped)
    }

    pub fn now(&self) -> Timestamp {
        (self.clock)()
    }
}

impl UploadSink for ReconcilerHandle {
    fn emit(&self, event: UploadEvent) {
        let msg = match event {
            UploadEvent::BatchPlanned { items } => Msg::BatchPlanned(items),
            UploadEvent::ItemStatus {
                index,
                status,
                message,
            } => Msg::UploadStatusChanged {
                index,
                status,
                message,
            },
            UploadEvent::Accepted {
                task_id, file_name, ..
            } => Msg::TaskAccepted {
                task_id,
                file_name,
                at: (self.clock)(),
            },
            UploadEvent::BatchAborted { message } => Msg::BatchAborted { message },
            UploadEvent::BatchSettled => Msg::BatchSettled,
        };
        if self.dispatch(msg).is_err() {
            engine_warn!("Upload event dropped, reconciler has stopped");
        }
    }
}

pub struct Reconciler {
    handle: ReconcilerHandle,
    effect_rx: mpsc::UnboundedReceiver<Effect>,
    task: JoinHandle<AppState>,
}

impl Reconciler {
    /// Starts the reconciler task on the current tokio runtime.
    pub fn spawn(clock: Clock) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (effect_tx, effect_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(AppState::new(), cmd_rx, effect_tx, clock.clone()));
        Self {
            handle: ReconcilerHandle { cmd_tx, clock },
            effect_rx,
            task,
        }
    }

    pub fn handle(&self) -> ReconcilerHandle {
        self.handle.clone()
    }

    /// Next effect produced by `update`; `None` after shutdown.
    pub async fn next_effect(&mut self) -> Option<Effect> {
        self.effect_rx.recv().await
    }

    pub fn try_next_effect(&mut self) -> Option<Effect> {
        self.effect_rx.try_recv().ok()
    }

    /// Stops the task after the commands already queued and returns the final state.
    pub async fn shutdown(self) -> Result<AppState, EngineError> {
        let _ = self.handle.cmd_tx.send(Command::Shutdown);
        self.task.await.map_err(|_| EngineError::Stopped)
    }
}

async fn run(
    mut state: AppState,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    effect_tx: mpsc::UnboundedSender<Effect>,
    clock: Clock,
) -> AppState {
    while let Some(command) = cmd_rx.recv().await {
        match command {
            Command::Dispatch(msg) => {
                let (next, effects) = update(state, msg);
                state = next;
                for effect in effects {
                    engine_debug!("Effect {:?}", effect);
                    let _ = effect_tx.send(effect);
                }
            }
            Command::Snapshot(reply) => {
                let mut view = state.view(clock());
                view.dirty = state.consume_dirty();
                let _ = reply.send(view);
            }
            Command::Task(task_id, reply) => {
                let _ = reply.send(state.task(&task_id).cloned());
            }
            Command::Shutdown => break,
        }
    }
    state
}
