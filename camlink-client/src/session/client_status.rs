use crate::channel::ChannelState;
use camlink_core::PeerConnectionState;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Connecting,
    Waiting,
    Recording,
    Uploading,
    Error,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Connecting => "connecting",
            SessionPhase::Waiting => "waiting",
            SessionPhase::Recording => "recording",
            SessionPhase::Uploading => "uploading",
            SessionPhase::Error => "error",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the camera side, published by the capture session.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientStatus {
    pub phase: SessionPhase,
    pub detail: String,
    pub channel: ChannelState,
    pub peer: Option<PeerConnectionState>,
    pub recording: Option<PathBuf>,
    pub upload_percent: Option<u8>,
    pub last_upload: Option<String>,
}

impl Default for ClientStatus {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Idle,
            detail: String::new(),
            channel: ChannelState::Disconnected,
            peer: None,
            recording: None,
            upload_percent: None,
            last_upload: None,
        }
    }
}
