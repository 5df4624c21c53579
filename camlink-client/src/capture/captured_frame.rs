use bytes::Bytes;
use image::RgbImage;
use std::sync::Arc;
use std::time::Duration;

/// One frame as delivered by a capture device.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub image: Arc<RgbImage>,
    /// Presentation time since the capture session started.
    pub timestamp: Duration,
    /// Hardware-encoded H.264 access unit, when the device produces one.
    pub sample: Option<Bytes>,
}

impl CapturedFrame {
    pub fn new(image: RgbImage, timestamp: Duration) -> Self {
        Self {
            image: Arc::new(image),
            timestamp,
            sample: None,
        }
    }

    pub fn with_sample(mut self, sample: Bytes) -> Self {
        self.sample = Some(sample);
        self
    }
}
