use std::num::NonZeroUsize;
use std::sync::Arc;

use engine_logging::{engine_error, engine_info, engine_warn};
use futures_util::future::join_all;
use futures_util::stream::{self, StreamExt};
use logmate_core::{plan_batch, FileHandle, TaskId, UploadStatus};
use tokio::sync::mpsc;

use crate::transport::UploadTransport;
use crate::{BatchError, BatchReport, ClientSettings, FailureKind, UploadError, UploadEvent};

/// Receives scheduler notifications as they happen.
pub trait UploadSink: Send + Sync {
    fn emit(&self, event: UploadEvent);
}

pub struct ChannelUploadSink {
    tx: mpsc::UnboundedSender<UploadEvent>,
}

impl ChannelUploadSink {
    pub fn new(tx: mpsc::UnboundedSender<UploadEvent>) -> Self {
        Self { tx }
    }
}

impl UploadSink for ChannelUploadSink {
    fn emit(&self, event: UploadEvent) {
        let _ = self.tx.send(event);
    }
}

struct ItemOutcome {
    status: UploadStatus,
    message: Option<String>,
    task_id: Option<TaskId>,
}

/// Turns a set of local files into one prioritized batch of concurrent uploads.
pub struct UploadScheduler {
    transport: Arc<dyn UploadTransport>,
    max_file_bytes: u64,
    max_concurrent: Option<NonZeroUsize>,
}

impl UploadScheduler {
    pub fn new(transport: Arc<dyn UploadTransport>, settings: &ClientSettings) -> Self {
        Self {
            transport,
            max_file_bytes: settings.max_file_bytes,
            max_concurrent: settings.max_concurrent_uploads,
        }
    }

    /// Uploads `files` smallest first and reports each acknowledged file to
    /// `sink` as [`UploadEvent::Accepted`].
    ///
    /// Per-file failures are recorded on their item and never abort the rest.
    /// The only error returned is a failed token fetch, in which case nothing
    /// was sent.
    pub async fn submit_batch(
        &self,
        files: Vec<FileHandle>,
        sink: &dyn UploadSink,
    ) -> Result<BatchReport, BatchError> {
        if files.is_empty() {
            return Ok(BatchReport::default());
        }

        let mut items = plan_batch(files);
        engine_info!(
            "Batch planned: {} files, dispatch order [{}]",
            items.len(),
            items
                .iter()
                .map(|item| format!("{} ({} bytes)", item.name(), item.size_bytes()))
                .collect::<Vec<_>>()
                .join(", ")
        );
        sink.emit(UploadEvent::BatchPlanned {
            items: items.clone(),
        });

        let token = match self.transport.fetch_token().await {
            Ok(token) => token,
            Err(err) => {
                engine_error!("Batch aborted, token fetch failed: {}", err);
                sink.emit(UploadEvent::BatchAborted {
                    message: err.to_string(),
                });
                return Err(BatchError::Auth(err));
            }
        };

        // Collected up front so the batch future stays `Send` across the await.
        let uploads: Vec<_> = items
            .iter()
            .enumerate()
            .map(|(index, item)| self.upload_one(index, &item.file, &token, sink))
            .collect();
        let outcomes: Vec<ItemOutcome> = match self.max_concurrent {
            None => join_all(uploads).await,
            Some(limit) => stream::iter(uploads).buffered(limit.get()).collect().await,
        };

        let mut accepted = Vec::new();
        for (item, outcome) in items.iter_mut().zip(outcomes) {
            item.status = outcome.status;
            item.message = outcome.message;
            if let Some(task_id) = outcome.task_id {
                accepted.push((task_id, item.file.name.clone()));
            }
        }

        let report = BatchReport { items, accepted };
        engine_info!(
            "Batch settled: {} accepted, {} failed",
            report.accepted.len(),
            report.failed_count()
        );
        sink.emit(UploadEvent::BatchSettled);
        Ok(report)
    }

    async fn upload_one(
        &self,
        index: usize,
        file: &FileHandle,
        token: &str,
        sink: &dyn UploadSink,
    ) -> ItemOutcome {
        if file.size_bytes > self.max_file_bytes {
            let err = UploadError::new(
                FailureKind::FileTooLarge {
                    max_bytes: self.max_file_bytes,
                    actual: file.size_bytes,
                },
                format!("{} exceeds the upload size limit", file.name),
            );
            engine_warn!("Rejected {} before upload: {}", file.name, err);
            return fail(index, err, sink);
        }

        sink.emit(UploadEvent::ItemStatus {
            index,
            status: UploadStatus::Uploading,
            message: None,
        });

        match self.transport.upload(file, token).await {
            Ok(task_id) => {
                engine_info!("Uploaded {} as task {}", file.name, task_id);
                sink.emit(UploadEvent::ItemStatus {
                    index,
                    status: UploadStatus::Complete,
                    message: None,
                });
                sink.emit(UploadEvent::Accepted {
                    index,
                    task_id: task_id.clone(),
                    file_name: file.name.clone(),
                });
                ItemOutcome {
                    status: UploadStatus::Complete,
                    message: None,
                    task_id: Some(task_id),
                }
            }
            Err(err) => {
                engine_warn!("Upload of {} failed: {}", file.name, err);
                fail(index, err, sink)
            }
        }
    }
}

fn fail(index: usize, err: UploadError, sink: &dyn UploadSink) -> ItemOutcome {
    let message = err.to_string();
    sink.emit(UploadEvent::ItemStatus {
        index,
        status: UploadStatus::Error,
        message: Some(message.clone()),
    });
    ItemOutcome {
        status: UploadStatus::Error,
        message: Some(message),
        task_id: None,
    }
}
