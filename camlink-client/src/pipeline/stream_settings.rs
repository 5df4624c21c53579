use crate::pipeline::SamplingPolicy;
use camlink_core::utils::{
    DEFAULT_CAPTURE_FPS, DEFAULT_JPEG_QUALITY, DEFAULT_STREAM_FPS, DEFAULT_STREAM_HEIGHT,
    DEFAULT_STREAM_WIDTH,
};

/// Live-preview parameters. All of them can change while streaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSettings {
    pub capture_fps: u32,
    pub target_fps: u32,
    /// Bounding box for streamed frames; larger frames are scaled down.
    pub max_width: u32,
    pub max_height: u32,
    /// JPEG quality, 1..=100.
    pub jpeg_quality: u8,
    pub sampling: SamplingPolicy,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            capture_fps: DEFAULT_CAPTURE_FPS,
            target_fps: DEFAULT_STREAM_FPS,
            max_width: DEFAULT_STREAM_WIDTH,
            max_height: DEFAULT_STREAM_HEIGHT,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            sampling: SamplingPolicy::Accumulator,
        }
    }
}
