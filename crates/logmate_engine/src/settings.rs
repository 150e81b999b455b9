use std::num::NonZeroUsize;
use std::time::Duration;

use logmate_core::MAX_UPLOAD_BYTES;
use url::Url;

use crate::StreamError;

/// Path of the status websocket on the analysis service.
pub const STREAM_PATH: &str = "/ws/logstatus/";

#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Root of the analysis service, e.g. `https://logs.example.com`.
    pub base_url: String,
    /// Explicit websocket url; derived from `base_url` when absent.
    pub stream_url: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub max_file_bytes: u64,
    /// `None` fans out one upload per file.
    pub max_concurrent_uploads: Option<NonZeroUsize>,
    pub csrf_path: String,
    pub upload_path: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            stream_url: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(300),
            max_file_bytes: MAX_UPLOAD_BYTES,
            max_concurrent_uploads: None,
            csrf_path: "/csrf-token/".to_string(),
            upload_path: "/upload/".to_string(),
        }
    }
}

impl ClientSettings {
    pub fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        Url::parse(&self.base_url)?.join(path)
    }

    /// The websocket url: `stream_url` if set, otherwise `base_url` with
    /// `http`/`https` swapped for `ws`/`wss` and the status path appended.
    pub fn resolved_stream_url(&self) -> Result<Url, StreamError> {
        if let Some(explicit) = &self.stream_url {
            return Url::parse(explicit).map_err(|err| StreamError::InvalidUrl(err.to_string()));
        }

        let mut url = self
            .endpoint(STREAM_PATH)
            .map_err(|err| StreamError::InvalidUrl(err.to_string()))?;
        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(StreamError::InvalidUrl(format!(
                    "unsupported scheme {other}"
                )))
            }
        };
        url.set_scheme(scheme)
            .map_err(|_| StreamError::InvalidUrl(format!("cannot use scheme {scheme}")))?;
        Ok(url)
    }
}
