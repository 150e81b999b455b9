use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use logmate_core::{TaskId, TaskRecord, Timestamp};
use serde_json::json;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("task {0} has no analysis result yet")]
    NotComplete(TaskId),
    #[error("export directory unusable: {0}")]
    OutputDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// `logmate_export_<stem>_<unix-ms>.json`, stem being the file name without
/// its last extension. Only the final path component of `file_name` is used,
/// since the name comes from the service.
pub fn export_filename(file_name: &str, now: Timestamp) -> String {
    let base = file_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(file_name);
    let base = match base {
        "" | "." | ".." => "task",
        other => other,
    };
    let stem = match base.rfind('.') {
        Some(idx) if idx > 0 => &base[..idx],
        _ => base,
    };
    format!("logmate_export_{}_{}.json", stem, now.timestamp_millis())
}

/// Writes the analysis result of a finished task into `dir` and returns the path.
pub fn export_result(
    record: &TaskRecord,
    dir: &Path,
    now: Timestamp,
) -> Result<PathBuf, ExportError> {
    let data = match (&record.result, record.is_complete()) {
        (Some(result), true) => result,
        _ => return Err(ExportError::NotComplete(record.id.clone())),
    };
    let document = json!({
        "exportDate": now.to_rfc3339(),
        "fileName": record.file_name,
        "taskId": record.id,
        "data": data,
    });
    let content = serde_json::to_string_pretty(&document)?;
    write_atomically(dir, &export_filename(&record.file_name, now), &content)
}

fn ensure_dir(dir: &Path) -> Result<(), ExportError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| ExportError::OutputDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(ExportError::OutputDir(format!(
                "{} is not a directory",
                dir.display()
            )));
        }
        Ok(())
    } else {
        fs::create_dir_all(dir).map_err(|e| ExportError::OutputDir(e.to_string()))
    }
}

/// Temp file in the target directory, synced, then renamed over the target.
fn write_atomically(dir: &Path, filename: &str, content: &str) -> Result<PathBuf, ExportError> {
    ensure_dir(dir)?;
    let target = dir.join(filename);
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(&target).map_err(|e| ExportError::Io(e.error))?;
    Ok(target)
}
