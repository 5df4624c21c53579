use serde::{Deserialize, Serialize};

/// ICE candidate as exchanged over the signaling socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    pub candidate: String,
    #[serde(default)]
    pub sdp_m_line_index: u16,
    #[serde(default)]
    pub sdp_mid: Option<String>,
}

/// Offer/answer/ICE exchange between a camera and its viewers.
///
/// The relay never decodes these beyond the `type` tag; it forwards the
/// original text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SignalingMessage {
    #[serde(rename = "offer")]
    Offer { sdp: String },

    #[serde(rename = "answer")]
    Answer { sdp: String },

    #[serde(rename = "ice", alias = "iceCandidate")]
    IceCandidate { candidate: IceCandidate },
}

impl SignalingMessage {
    /// Wire values of `type` that mark a negotiation message.
    pub const TYPES: [&'static str; 4] = ["offer", "answer", "ice", "iceCandidate"];

    pub fn is_signaling_type(kind: &str) -> bool {
        Self::TYPES.contains(&kind)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SignalingMessage::Offer { .. } => "offer",
            SignalingMessage::Answer { .. } => "answer",
            SignalingMessage::IceCandidate { .. } => "ice",
        }
    }
}
