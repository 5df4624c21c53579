use camlink_core::{ControlCommand, SignalingMessage};

/// Lifecycle of a [`SignalingChannel`](super::SignalingChannel).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
    /// Reconnect attempts exhausted; only a manual reconnect leaves this state.
    GaveUp,
}

/// Delivered to the owner of a channel, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Connected,
    Disconnected { reason: String },
    Signaling(SignalingMessage),
    Command(ControlCommand),
    GaveUp,
}
