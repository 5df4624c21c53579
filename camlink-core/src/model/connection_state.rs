use serde::{Deserialize, Serialize};
use std::fmt;

/// Last ICE connection state reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeerConnectionState {
    New,
    Checking,
    Connected,
    Completed,
    Failed,
    Disconnected,
    Closed,
}

impl PeerConnectionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PeerConnectionState::Failed | PeerConnectionState::Closed
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PeerConnectionState::New => "new",
            PeerConnectionState::Checking => "checking",
            PeerConnectionState::Connected => "connected",
            PeerConnectionState::Completed => "completed",
            PeerConnectionState::Failed => "failed",
            PeerConnectionState::Disconnected => "disconnected",
            PeerConnectionState::Closed => "closed",
        }
    }
}

impl fmt::Display for PeerConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
