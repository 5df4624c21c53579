mod command;
mod connection_state;
mod endpoint;
mod role;
mod signaling;
mod status;

pub use command::{CommandMessage, ControlCommand};
pub use connection_state::PeerConnectionState;
pub use endpoint::EndpointId;
pub use role::Role;
pub use signaling::{IceCandidate, SignalingMessage};
pub use status::{CameraStatus, StatusMessage};
