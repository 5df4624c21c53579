use crate::registry::ConnectionRegistry;
use crate::routing::inbound::Inbound;
use axum::extract::ws::Message;
use bytes::Bytes;
use camlink_core::{CameraStatus, CommandMessage, ControlCommand, EndpointId, Role};
use tracing::{debug, error, info, warn};

/// Result of routing a single inbound payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    Forwarded { kind: &'static str, recipients: usize },
    Dropped { kind: &'static str },
}

/// Applies the relay's forwarding rules to inbound payloads.
#[derive(Clone)]
pub struct MessageRouter {
    registry: ConnectionRegistry,
    min_frame_bytes: usize,
}

impl MessageRouter {
    pub fn new(registry: ConnectionRegistry, min_frame_bytes: usize) -> Self {
        Self {
            registry,
            min_frame_bytes,
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    pub fn route(&self, origin: EndpointId, role: Role, payload: Bytes) -> RouteOutcome {
        let inbound = Inbound::classify(payload, self.min_frame_bytes);
        let kind = inbound.label();

        match (inbound, role) {
            (Inbound::Signaling { kind: signal, text }, _) => {
                info!("{} {} sent {}", role, origin, signal);
                self.forward(kind, role.opposite(), Message::Text(text.into()))
            }
            (Inbound::Status(status), Role::Camera) => {
                info!("Camera {} status: {}", origin, status);
                let wrapped = CameraStatus {
                    camera_id: origin,
                    status,
                };
                self.forward_json(kind, Role::Viewer, &wrapped)
            }
            (Inbound::Command(command), Role::Viewer) => {
                info!("Viewer {} command: {}", origin, command);
                let msg = CommandMessage {
                    command,
                    timestamp: None,
                };
                self.forward_json(kind, Role::Camera, &msg)
            }
            (Inbound::Frame(frame), Role::Camera) => {
                debug!("Camera {} frame: {} bytes", origin, frame.len());
                self.forward(kind, Role::Viewer, Message::Binary(frame))
            }
            (Inbound::Noise { len }, _) => {
                debug!("Dropped {} byte non-JSON payload from {} {}", len, role, origin);
                RouteOutcome::Dropped { kind }
            }
            (_, _) => {
                warn!("Dropped {} message from {} {}", kind, role, origin);
                RouteOutcome::Dropped { kind }
            }
        }
    }

    /// Sends a control command to every connected camera.
    pub fn broadcast_command(&self, command: &ControlCommand) -> usize {
        let msg = CommandMessage::new(command);
        match self.forward_json("command", Role::Camera, &msg) {
            RouteOutcome::Forwarded { recipients, .. } => recipients,
            RouteOutcome::Dropped { .. } => 0,
        }
    }

    fn forward_json<T: serde::Serialize>(
        &self,
        kind: &'static str,
        to: Role,
        value: &T,
    ) -> RouteOutcome {
        match serde_json::to_string(value) {
            Ok(json) => self.forward(kind, to, Message::Text(json.into())),
            Err(e) => {
                error!("Failed to serialize {} message: {}", kind, e);
                RouteOutcome::Dropped { kind }
            }
        }
    }

    fn forward(&self, kind: &'static str, to: Role, msg: Message) -> RouteOutcome {
        let recipients = self.registry.broadcast(to, msg);
        RouteOutcome::Forwarded { kind, recipients }
    }
}
