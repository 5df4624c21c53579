use crate::error::ClientError;
use camlink_core::utils::{UPLOAD_BACKOFF_BASE, UPLOAD_MAX_RETRIES, UPLOAD_TIMEOUT};
use reqwest::Url;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub url: String,
    /// Multipart field carrying the file.
    pub field_name: String,
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub backoff_base: Duration,
    /// Per attempt.
    pub timeout: Duration,
}

impl UploadConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:3000/upload".to_owned(),
            field_name: "video".to_owned(),
            max_retries: UPLOAD_MAX_RETRIES,
            backoff_base: UPLOAD_BACKOFF_BASE,
            timeout: UPLOAD_TIMEOUT,
        }
    }
}

/// Delay before retry number `attempt` (1-based): `base * 2^attempt`.
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

/// Upload endpoint on the same host as the relay socket:
/// `ws://host:port/camera` becomes `http://host:port/upload`.
pub fn upload_url_for(signaling_url: &str, http_port: Option<u16>) -> Result<String, ClientError> {
    let invalid = || ClientError::InvalidUrl(signaling_url.to_owned());

    let mut url = Url::parse(signaling_url).map_err(|_| invalid())?;
    let scheme = match url.scheme() {
        "ws" | "http" => "http",
        "wss" | "https" => "https",
        _ => return Err(invalid()),
    };

    url.set_scheme(scheme).map_err(|_| invalid())?;
    if let Some(port) = http_port {
        url.set_port(Some(port)).map_err(|_| invalid())?;
    }
    url.set_path("/upload");
    url.set_query(None);
    url.set_fragment(None);

    Ok(url.to_string())
}
