use crate::model::EndpointId;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Camera presence/state announcement, `{"type":"status",...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "status")]
pub struct StatusMessage {
    pub status: String,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
}

impl StatusMessage {
    pub fn new(status: impl Into<String>) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();

        Self {
            status: status.into(),
            timestamp,
        }
    }

    pub fn waiting() -> Self {
        Self::new("waiting")
    }
}

/// Relay re-wrap of a camera status for viewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "camera_status", rename_all = "camelCase")]
pub struct CameraStatus {
    pub camera_id: EndpointId,
    pub status: String,
}
