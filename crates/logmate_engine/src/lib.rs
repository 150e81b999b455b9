//! LogMate engine: upload scheduling, status stream and the reconciler task.
mod export;
mod reconciler;
mod scheduler;
mod settings;
mod stream;
mod transport;
mod types;

pub use export::{export_filename, export_result, ExportError};
pub use reconciler::{system_clock, Clock, Reconciler, ReconcilerHandle};
pub use scheduler::{ChannelUploadSink, UploadScheduler, UploadSink};
pub use settings::{ClientSettings, STREAM_PATH};
pub use stream::{StatusStream, StreamPump};
pub use transport::{ReqwestTransport, UploadTransport, CSRF_HEADER, FILE_FIELD};
pub use types::{
    BatchError, BatchReport, EngineError, FailureKind, StreamError, UploadError, UploadEvent,
};
