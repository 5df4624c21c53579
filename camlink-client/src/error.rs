use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("camera access denied")]
    PermissionDenied,

    #[error("invalid capture configuration: {0}")]
    InvalidConfig(String),

    #[error("capture session is not running")]
    NotRunning,

    #[error("already recording")]
    AlreadyRecording,

    #[error("recording failed: {0}")]
    Recording(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum PeerError {
    #[error("peer connection not set up")]
    NotInitialized,

    #[error("webrtc: {0}")]
    WebRtc(#[from] webrtc::Error),
}

#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("empty frame")]
    EmptyFrame,

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("upload cancelled")]
    Cancelled,

    #[error("server answered {0}")]
    Status(u16),

    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("file: {0}")]
    Io(#[from] std::io::Error),

    #[error("upload failed after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },
}

impl UploadError {
    /// Local file problems and cancellation will not improve with another try.
    pub fn is_retryable(&self) -> bool {
        matches!(self, UploadError::Status(_) | UploadError::Http(_))
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid url '{0}'")]
    InvalidUrl(String),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Peer(#[from] PeerError),

    #[error(transparent)]
    Upload(#[from] UploadError),
}
