use camlink_core::utils::{DEFAULT_HTTP_PORT, MIN_FRAME_BYTES};
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_MAX_UPLOAD_BYTES: u64 = 2 * 1024 * 1024 * 1024;

/// Relay server settings.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind_addr: SocketAddr,
    pub upload_dir: PathBuf,
    /// Non-JSON payloads must be larger than this to be relayed as frames.
    pub min_frame_bytes: usize,
    /// Per-connection outbound queue; a peer whose queue is full gets dropped.
    pub outbound_queue_capacity: usize,
    pub max_upload_bytes: usize,
    /// Extensions listed by `GET /videos`.
    pub video_extensions: Vec<String>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_HTTP_PORT)),
            upload_dir: PathBuf::from("uploads"),
            min_frame_bytes: MIN_FRAME_BYTES,
            outbound_queue_capacity: 256,
            // Saturates on 32-bit targets.
            max_upload_bytes: usize::try_from(DEFAULT_MAX_UPLOAD_BYTES).unwrap_or(usize::MAX),
            video_extensions: vec!["mov".to_owned(), "mp4".to_owned(), "mjpeg".to_owned()],
        }
    }
}
