use crate::error::UploadError;
use crate::upload::{UploadConfig, backoff_delay};
use futures::TryStreamExt;
use reqwest::Body;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::task::JoinHandle;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub bytes_sent: u64,
    pub total: u64,
}

impl UploadProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.bytes_sent as f64 / self.total as f64
        }
    }
}

pub type ProgressCallback = Arc<dyn Fn(UploadProgress) + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub struct UploadReport {
    pub bytes: u64,
    pub attempts: u32,
    /// Name the server stored the file under, when it says.
    pub stored_as: Option<String>,
    pub response: Value,
}

/// A background upload that can be cancelled.
pub struct UploadHandle {
    path: PathBuf,
    cancel: CancellationToken,
    task: JoinHandle<Result<UploadReport, UploadError>>,
}

impl UploadHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Aborts the transfer in flight; no retry follows and the file stays.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn wait(self) -> Result<UploadReport, UploadError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(UploadError::Cancelled),
            Err(e) => Err(UploadError::Io(std::io::Error::other(e))),
        }
    }
}

/// Multipart file upload with exponential backoff.
///
/// The local file is removed after the server accepts it and kept on any
/// failure or cancellation.
#[derive(Clone)]
pub struct UploadCoordinator {
    client: reqwest::Client,
    config: UploadConfig,
}

impl UploadCoordinator {
    pub fn new(config: UploadConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: UploadConfig) -> Self {
        Self { client, config }
    }

    /// Runs [`upload`](Self::upload) on a background task.
    pub fn start(&self, path: PathBuf, on_progress: Option<ProgressCallback>) -> UploadHandle {
        let cancel = CancellationToken::new();
        let coordinator = self.clone();
        let task_cancel = cancel.clone();
        let task_path = path.clone();

        let task = tokio::spawn(async move {
            coordinator
                .upload(&task_path, &task_cancel, on_progress)
                .await
        });

        UploadHandle { path, cancel, task }
    }

    pub async fn upload(
        &self,
        path: &Path,
        cancel: &CancellationToken,
        on_progress: Option<ProgressCallback>,
    ) -> Result<UploadReport, UploadError> {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!("Upload of {} cancelled", path.display());
                    return Err(UploadError::Cancelled);
                }
                r = self.attempt(path, on_progress.clone()) => r,
            };

            let err = match result {
                Ok((bytes, response)) => {
                    if let Err(e) = tokio::fs::remove_file(path).await {
                        warn!("Uploaded {} but could not delete it: {}", path.display(), e);
                    }
                    info!(
                        "Uploaded {} ({} bytes, attempt {})",
                        path.display(),
                        bytes,
                        attempt
                    );
                    return Ok(UploadReport {
                        bytes,
                        attempts: attempt,
                        stored_as: response["filename"].as_str().map(str::to_owned),
                        response,
                    });
                }
                Err(e) => e,
            };

            if !err.is_retryable() {
                error!("Upload of {} failed: {}", path.display(), err);
                return Err(err);
            }

            if attempt > self.config.max_retries {
                error!(
                    "Upload of {} failed after {} attempts: {}",
                    path.display(),
                    attempt,
                    err
                );
                return Err(UploadError::RetriesExhausted {
                    attempts: attempt,
                    last: err.to_string(),
                });
            }

            let delay = backoff_delay(self.config.backoff_base, attempt);
            warn!(
                "Upload attempt {} failed: {}; retrying in {:?}",
                attempt, err, delay
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!("Upload of {} cancelled", path.display());
                    return Err(UploadError::Cancelled);
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    async fn attempt(
        &self,
        path: &Path,
        on_progress: Option<ProgressCallback>,
    ) -> Result<(u64, Value), UploadError> {
        let file = tokio::fs::File::open(path).await?;
        let total = file.metadata().await?.len();

        let sent = Arc::new(AtomicU64::new(0));
        let stream = ReaderStream::new(file).inspect_ok(move |chunk| {
            let len = chunk.len() as u64;
            let bytes_sent = sent.fetch_add(len, Ordering::Relaxed) + len;
            if let Some(callback) = &on_progress {
                callback(UploadProgress { bytes_sent, total });
            }
        });

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("recording")
            .to_owned();

        let part = Part::stream_with_length(Body::wrap_stream(stream), total)
            .file_name(filename)
            .mime_str(mime_for(path))?;
        let form = Form::new().part(self.config.field_name.clone(), part);

        let response = self
            .client
            .post(&self.config.url)
            .multipart(form)
            .timeout(self.config.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Status(status.as_u16()));
        }

        // A 2xx means stored; an unreadable body only loses the stored name.
        let body = match response.json::<Value>().await {
            Ok(body) => body,
            Err(e) => {
                warn!("Upload accepted ({}) but the response was unreadable: {}", status, e);
                Value::Null
            }
        };
        Ok((total, body))
    }
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("mov") => "video/quicktime",
        Some("mp4") => "video/mp4",
        Some("mjpeg") => "video/x-motion-jpeg",
        _ => "application/octet-stream",
    }
}
