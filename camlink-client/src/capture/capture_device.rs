use crate::capture::CapturedFrame;
use crate::error::CaptureError;
use async_trait::async_trait;
use camlink_core::utils::{DEFAULT_CAPTURE_FPS, DEFAULT_CAPTURE_HEIGHT, DEFAULT_CAPTURE_WIDTH};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureConfig {
    pub fps: u32,
    pub width: u32,
    pub height: u32,
}

impl CaptureConfig {
    pub fn validate(&self) -> Result<(), CaptureError> {
        if self.fps == 0 {
            return Err(CaptureError::InvalidConfig("fps must be positive".into()));
        }
        if self.width == 0 || self.height == 0 {
            return Err(CaptureError::InvalidConfig(format!(
                "bad resolution {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_CAPTURE_FPS,
            width: DEFAULT_CAPTURE_WIDTH,
            height: DEFAULT_CAPTURE_HEIGHT,
        }
    }
}

/// Receives frames on the capture thread. Must return quickly and never block.
pub trait FrameSink: Send + Sync {
    fn on_frame(&self, frame: &CapturedFrame);
}

/// A camera the capture session can drive.
#[async_trait]
pub trait CaptureDevice: Send {
    async fn configure(&mut self, config: &CaptureConfig) -> Result<(), CaptureError>;

    async fn start_session(&mut self, sink: Arc<dyn FrameSink>) -> Result<(), CaptureError>;

    async fn stop_session(&mut self);

    async fn start_recording(&mut self, path: &Path) -> Result<(), CaptureError>;

    /// Finishes the current recording and returns its file, if one was running.
    async fn stop_recording(&mut self) -> Result<Option<PathBuf>, CaptureError>;

    fn is_recording(&self) -> bool;

    /// Extension used for recordings, without the dot.
    fn recording_extension(&self) -> &str;
}
