use serde::{Deserialize, Serialize};
use std::fmt;

/// Remote control command sent by a viewer (or the HTTP control API) to cameras.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    Start,
    Stop,
    Reconnect,
    Unknown(String),
}

impl ControlCommand {
    pub fn as_str(&self) -> &str {
        match self {
            ControlCommand::Start => "start",
            ControlCommand::Stop => "stop",
            ControlCommand::Reconnect => "reconnect",
            ControlCommand::Unknown(raw) => raw,
        }
    }
}

impl From<&str> for ControlCommand {
    fn from(raw: &str) -> Self {
        match raw {
            "start" => ControlCommand::Start,
            "stop" => ControlCommand::Stop,
            "reconnect" => ControlCommand::Reconnect,
            other => ControlCommand::Unknown(other.to_string()),
        }
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `{"command": "..."}` envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandMessage {
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
}

impl CommandMessage {
    pub fn new(command: &ControlCommand) -> Self {
        Self {
            command: command.as_str().to_string(),
            timestamp: None,
        }
    }

    pub fn command(&self) -> ControlCommand {
        ControlCommand::from(self.command.as_str())
    }
}
