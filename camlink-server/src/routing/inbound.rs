use bytes::Bytes;
use camlink_core::SignalingMessage;
use serde_json::{Map, Value};

/// What a raw inbound payload turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Offer, answer or ICE candidate; `text` is the payload exactly as received.
    Signaling { kind: String, text: String },
    Status(String),
    Command(String),
    /// Opaque video frame, relayed byte for byte.
    Frame(Bytes),
    /// JSON that matched no known shape.
    Unrecognized,
    /// Not JSON and too small to be a frame.
    Noise { len: usize },
}

impl Inbound {
    /// Classifies one WebSocket payload, text or binary alike.
    pub fn classify(payload: Bytes, min_frame_bytes: usize) -> Self {
        match serde_json::from_slice::<Value>(&payload) {
            Ok(Value::Object(map)) => Self::from_object(&payload, &map),
            Ok(_) => Self::Unrecognized,
            Err(_) if payload.len() > min_frame_bytes => Self::Frame(payload),
            Err(_) => Self::Noise { len: payload.len() },
        }
    }

    fn from_object(payload: &Bytes, map: &Map<String, Value>) -> Self {
        if let Some(kind) = map.get("type").and_then(Value::as_str)
            && SignalingMessage::is_signaling_type(kind)
        {
            return match std::str::from_utf8(payload) {
                Ok(text) => Self::Signaling {
                    kind: kind.to_owned(),
                    text: text.to_owned(),
                },
                Err(_) => Self::Unrecognized,
            };
        }

        if let Some(status) = field_text(map, "status") {
            return Self::Status(status);
        }

        if let Some(command) = field_text(map, "command") {
            return Self::Command(command);
        }

        Self::Unrecognized
    }

    pub fn label(&self) -> &'static str {
        match self {
            Inbound::Signaling { .. } => "signaling",
            Inbound::Status(_) => "status",
            Inbound::Command(_) => "command",
            Inbound::Frame(_) => "frame",
            Inbound::Unrecognized => "unrecognized",
            Inbound::Noise { .. } => "noise",
        }
    }
}

fn field_text(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
