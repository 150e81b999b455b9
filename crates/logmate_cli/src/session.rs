//! One upload session: open the status stream, submit the batch, follow the
//! tasks until they settle, then tear everything down in order.
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use engine_logging::{engine_error, engine_info, engine_warn};
use logmate_core::{
    summarize_result, AppViewModel, Effect, FileHandle, Msg, TaskId, TaskRecord, TaskStatus,
};
use logmate_engine::{
    export_result, system_clock, BatchError, BatchReport, Reconciler, ReconcilerHandle,
    ReqwestTransport, StatusStream, StreamPump, UploadScheduler,
};
use tokio::task::JoinHandle;

use crate::config::RunConfig;
use crate::render::{format_result_summary, render};

#[derive(Debug, Default)]
pub struct SessionSummary {
    pub accepted: usize,
    pub failed_uploads: usize,
    pub completed: usize,
    pub errored: usize,
    pub unfinished: usize,
    pub exported: Vec<PathBuf>,
    pub aborted: Option<String>,
    pub interrupted: bool,
}

impl SessionSummary {
    pub fn is_success(&self) -> bool {
        self.aborted.is_none()
            && !self.interrupted
            && self.failed_uploads == 0
            && self.errored == 0
            && self.unfinished == 0
    }

    fn record_view(&mut self, view: &AppViewModel) {
        self.completed = view.completed_count;
        self.errored = view
            .tasks
            .iter()
            .filter(|row| row.status == TaskStatus::Error)
            .count();
        self.unfinished = view.task_count - self.completed - self.errored;
    }
}

type BatchTask = JoinHandle<Result<BatchReport, BatchError>>;

struct Session {
    config: RunConfig,
    scheduler: Arc<UploadScheduler>,
    reconciler: Reconciler,
    handle: ReconcilerHandle,
    batch: Option<BatchTask>,
    selected: HashSet<TaskId>,
    summary: SessionSummary,
}

pub async fn run(config: RunConfig, files: Vec<FileHandle>) -> Result<SessionSummary> {
    let stream_url = config.settings.resolved_stream_url()?;
    let stream = StatusStream::open(&stream_url)
        .await
        .with_context(|| format!("opening status stream {stream_url}"))?;

    let transport = ReqwestTransport::new(config.settings.clone())
        .context("building http client")?;
    let scheduler = Arc::new(UploadScheduler::new(Arc::new(transport), &config.settings));

    let reconciler = Reconciler::spawn(system_clock());
    let handle = reconciler.handle();
    let pump = StreamPump::spawn(stream, handle.clone());

    let mut session = Session {
        config,
        scheduler,
        reconciler,
        handle,
        batch: None,
        selected: HashSet::new(),
        summary: SessionSummary::default(),
    };
    let outcome = session.follow(files, &pump).await;

    match pump.stop().await {
        Ok(applied) => engine_info!("Status stream delivered {} events", applied),
        Err(err) => engine_warn!("Closing status stream failed: {}", err),
    }
    let Session {
        reconciler,
        mut summary,
        ..
    } = session;
    let state = reconciler.shutdown().await?;
    engine_info!("Session ended with {} tasks", state.tasks().len());

    outcome?;
    summary.record_view(&state.view(chrono::Utc::now()));
    Ok(summary)
}

impl Session {
    async fn follow(&mut self, files: Vec<FileHandle>, pump: &StreamPump) -> Result<()> {
        self.handle.dispatch(Msg::FilesSubmitted(files))?;

        let mut ticker = tokio::time::interval(self.config.refresh);
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            tokio::select! {
                Some(effect) = self.reconciler.next_effect() => {
                    self.handle_effect(effect).await?;
                }
                _ = ticker.tick() => {
                    self.handle.dispatch(Msg::Tick)?;
                    let view = self.handle.snapshot().await?;
                    if view.dirty {
                        println!("{}", render(&view));
                    }
                    self.select_completed(&view)?;
                    if self.batch.is_some() && !view.uploading && all_settled(&view) {
                        break;
                    }
                    if pump.is_finished() && !view.uploading {
                        let open = view
                            .tasks
                            .iter()
                            .filter(|row| row.status == TaskStatus::Processing)
                            .count();
                        engine_warn!("Status stream ended with {} tasks still processing", open);
                        eprintln!("status stream closed; {open} tasks left unfinished");
                        break;
                    }
                }
                _ = &mut ctrl_c => {
                    engine_warn!("Interrupted, stopping session");
                    self.summary.interrupted = true;
                    break;
                }
            }
        }

        self.finish_batch().await;
        self.drain_selections().await
    }

    async fn handle_effect(&mut self, effect: Effect) -> Result<()> {
        match effect {
            Effect::SubmitBatch { files } => {
                let scheduler = self.scheduler.clone();
                let sink = self.handle.clone();
                self.batch = Some(tokio::spawn(async move {
                    scheduler.submit_batch(files, &sink).await
                }));
            }
            Effect::Alert { message } => {
                engine_error!("{}", message);
                eprintln!("error: {message}");
                self.summary.aborted = Some(message);
            }
            Effect::TaskSelected { task_id } => self.show_selected(&task_id).await?,
        }
        Ok(())
    }

    /// Selects each newly completed task once, which shows its results and
    /// triggers its export.
    fn select_completed(&mut self, view: &AppViewModel) -> Result<()> {
        for row in view.tasks.iter().filter(|row| row.status == TaskStatus::Complete) {
            if self.selected.insert(row.task_id.clone()) {
                self.handle.dispatch(Msg::TaskClicked {
                    task_id: row.task_id.clone(),
                })?;
            }
        }
        Ok(())
    }

    async fn show_selected(&mut self, task_id: &TaskId) -> Result<()> {
        let Some(record) = self.handle.task(task_id.clone()).await? else {
            return Ok(());
        };
        match record.result.as_ref().map(summarize_result) {
            Some(Ok(summary)) => {
                println!("{}", format_result_summary(&record.file_name, &summary));
            }
            Some(Err(err)) => {
                engine_warn!("Result of {} has an unexpected shape: {}", task_id, err);
            }
            None => engine_info!("Task {} completed without a result", task_id),
        }

        let Some(dir) = self.config.export_dir.clone() else {
            return Ok(());
        };
        self.export(&record, &dir);
        Ok(())
    }

    fn export(&mut self, record: &TaskRecord, dir: &Path) {
        match export_result(record, dir, self.handle.now()) {
            Ok(path) => {
                engine_info!("Exported {} to {:?}", record.id, path);
                println!("exported {} -> {}", record.file_name, path.display());
                self.summary.exported.push(path);
            }
            Err(err) => {
                engine_error!("Export of {} failed: {}", record.id, err);
                eprintln!("export of {} failed: {err}", record.file_name);
            }
        }
    }

    async fn finish_batch(&mut self) {
        let Some(batch) = self.batch.take() else {
            return;
        };
        if self.summary.interrupted && !batch.is_finished() {
            batch.abort();
        }
        match batch.await {
            Ok(Ok(report)) => {
                self.summary.accepted = report.accepted.len();
                self.summary.failed_uploads = report.failed_count();
            }
            Ok(Err(err)) => engine_warn!("Batch did not run: {}", err),
            Err(join_err) if join_err.is_cancelled() => engine_info!("Batch cancelled"),
            Err(join_err) => engine_error!("Batch task failed: {}", join_err),
        }
    }

    /// Handles effects still queued when the loop ended, using a snapshot as
    /// a barrier so every earlier dispatch has been applied.
    async fn drain_selections(&mut self) -> Result<()> {
        let view = self.handle.snapshot().await?;
        self.select_completed(&view)?;
        self.handle.snapshot().await?;
        while let Some(effect) = self.reconciler.try_next_effect() {
            self.handle_effect(effect).await?;
        }
        Ok(())
    }
}

fn all_settled(view: &AppViewModel) -> bool {
    view.tasks
        .iter()
        .all(|row| row.status != TaskStatus::Processing)
}
