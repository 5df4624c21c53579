use camlink_core::{IceCandidate, PeerConnectionState};

#[derive(Debug, Clone, PartialEq)]
pub enum PeerEvent {
    /// Bitrate-capped offer, ready to go out over signaling.
    OfferReady { sdp: String },
    IceCandidateReady(IceCandidate),
    ConnectionStateChanged(PeerConnectionState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationPhase {
    Uninitialized,
    Idle,
    OfferSent,
    Negotiated,
    Closed,
}
