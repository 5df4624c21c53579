pub mod capture;
pub mod channel;
mod error;
pub mod peer;
pub mod pipeline;
pub mod session;
pub mod upload;

pub use capture::{CaptureConfig, CaptureDevice, CapturedFrame, FrameSink, SyntheticCamera};
pub use channel::{ChannelConfig, ChannelEvent, ChannelState, SignalingChannel};
pub use error::*;
pub use peer::{NegotiationPhase, PeerConfig, PeerEvent, PeerSignaling, VideoCapturer};
pub use pipeline::{FrameEncoder, FrameStreamingPipeline, JpegFrameEncoder, StreamSettings};
pub use session::{CaptureSession, ClientStatus, SessionConfig, SessionPhase, TransportStrategy};
pub use upload::{UploadConfig, UploadCoordinator, UploadHandle, UploadProgress, UploadReport};
