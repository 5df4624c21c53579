use crate::capture::CaptureConfig;
use crate::channel::ChannelConfig;
use crate::error::ClientError;
use crate::peer::PeerConfig;
use crate::pipeline::StreamSettings;
use crate::upload::{UploadConfig, upload_url_for};
use std::path::PathBuf;

/// How live video leaves the camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportStrategy {
    /// Peer connection negotiated through the relay.
    WebRtc,
    /// JPEG frames pushed through the relay socket.
    Relay,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub transport: TransportStrategy,
    pub channel: ChannelConfig,
    pub peer: PeerConfig,
    pub stream: StreamSettings,
    pub capture: CaptureConfig,
    pub upload: UploadConfig,
    /// Finished recordings wait here until uploaded.
    pub recordings_dir: PathBuf,
}

impl SessionConfig {
    /// Defaults for a camera talking to the relay at `signaling_url`; uploads
    /// go to the same host.
    pub fn for_relay(
        signaling_url: &str,
        transport: TransportStrategy,
    ) -> Result<Self, ClientError> {
        let upload = UploadConfig::new(upload_url_for(signaling_url, None)?);

        Ok(Self {
            transport,
            channel: ChannelConfig::new(signaling_url),
            peer: PeerConfig::default(),
            stream: StreamSettings::default(),
            capture: CaptureConfig::default(),
            upload,
            recordings_dir: std::env::temp_dir().join("camlink-recordings"),
        })
    }
}
