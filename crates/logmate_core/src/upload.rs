use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Per-file size ceiling enforced before any network call (600 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 600 * 1024 * 1024;

/// A local file selected for analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    pub path: PathBuf,
    pub name: String,
    pub size_bytes: u64,
}

impl FileHandle {
    pub fn new(path: impl Into<PathBuf>, name: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            size_bytes,
        }
    }

    /// Reads the size from the filesystem and uses the final path component as name.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", path.display()),
            ));
        }
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(path, name, metadata.len()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Queued,
    Uploading,
    Complete,
    Error,
}

impl UploadStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, UploadStatus::Complete | UploadStatus::Error)
    }
}

/// One file of a batch as tracked by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadItem {
    pub file: FileHandle,
    pub status: UploadStatus,
    pub message: Option<String>,
}

impl UploadItem {
    pub fn queued(file: FileHandle) -> Self {
        Self {
            file,
            status: UploadStatus::Queued,
            message: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.file.name
    }

    pub fn size_bytes(&self) -> u64 {
        self.file.size_bytes
    }
}

/// Orders a batch smallest file first so quick jobs report back before large
/// ones take the bandwidth. The sort is stable: equal sizes keep input order.
pub fn plan_batch(files: Vec<FileHandle>) -> Vec<UploadItem> {
    let mut items: Vec<UploadItem> = files.into_iter().map(UploadItem::queued).collect();
    items.sort_by_key(UploadItem::size_bytes);
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_path_rejects_directories() {
        let dir = std::env::temp_dir();
        let err = FileHandle::from_path(&dir).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn equal_sizes_keep_input_order() {
        let items = plan_batch(vec![
            FileHandle::new("b.log", "b.log", 10),
            FileHandle::new("a.log", "a.log", 10),
            FileHandle::new("c.log", "c.log", 1),
        ]);
        let names: Vec<_> = items.iter().map(UploadItem::name).collect();
        assert_eq!(names, vec!["c.log", "b.log", "a.log"]);
    }
}
