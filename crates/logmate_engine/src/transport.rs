use logmate_core::{FileHandle, TaskId};
use reqwest::header::REFERER;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Response};
use serde::Deserialize;
use tokio_util::io::ReaderStream;

use crate::{ClientSettings, FailureKind, UploadError};

/// Multipart field carrying the file payload.
pub const FILE_FIELD: &str = "log_file";
/// Header carrying the anti-forgery token on every upload.
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Network boundary of the upload scheduler.
#[async_trait::async_trait]
pub trait UploadTransport: Send + Sync {
    /// One request per batch; the token is shared by every upload in it.
    async fn fetch_token(&self) -> Result<String, UploadError>;

    async fn upload(&self, file: &FileHandle, token: &str) -> Result<TaskId, UploadError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(rename = "csrfToken")]
    csrf_token: String,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    task_id: String,
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    settings: ClientSettings,
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(settings: ClientSettings) -> Result<Self, UploadError> {
        // The token endpoint also sets a cookie that must accompany the header.
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .cookie_store(true)
            .build()
            .map_err(|err| UploadError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    fn url(&self, path: &str) -> Result<reqwest::Url, UploadError> {
        self.settings
            .endpoint(path)
            .map_err(|err| {
                UploadError::new(
                    FailureKind::InvalidEndpoint,
                    format!("{}{}: {}", self.settings.base_url, path, err),
                )
            })
    }
}

#[async_trait::async_trait]
impl UploadTransport for ReqwestTransport {
    async fn fetch_token(&self) -> Result<String, UploadError> {
        let response = self
            .client
            .get(self.url(&self.settings.csrf_path)?)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body: TokenResponse = ensure_success(response)?
            .json()
            .await
            .map_err(map_reqwest_error)?;
        Ok(body.csrf_token)
    }

    async fn upload(&self, file: &FileHandle, token: &str) -> Result<TaskId, UploadError> {
        let handle = tokio::fs::File::open(&file.path)
            .await
            .map_err(|err| UploadError::new(FailureKind::Io, err.to_string()))?;
        let body = Body::wrap_stream(ReaderStream::new(handle));
        let part = Part::stream_with_length(body, file.size_bytes).file_name(file.name.clone());
        let form = Form::new().part(FILE_FIELD, part);

        let response = self
            .client
            .post(self.url(&self.settings.upload_path)?)
            .header(CSRF_HEADER, token)
            .header(REFERER, self.settings.base_url.as_str())
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body: UploadResponse = ensure_success(response)?
            .json()
            .await
            .map_err(map_reqwest_error)?;
        Ok(TaskId::new(body.task_id))
    }
}

fn ensure_success(response: Response) -> Result<Response, UploadError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(UploadError::new(
            FailureKind::HttpStatus(status.as_u16()),
            status.to_string(),
        ))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> UploadError {
    if err.is_timeout() {
        return UploadError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return UploadError::new(FailureKind::InvalidResponse, err.to_string());
    }
    UploadError::new(FailureKind::Network, err.to_string())
}
