use std::time::Duration;

pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun1.l.google.com:19302";

/// Payloads of this size or smaller are never treated as video frames.
pub const MIN_FRAME_BYTES: usize = 1000;

pub const DEFAULT_MAX_BITRATE_KBPS: u32 = 2000;

pub const DEFAULT_CAPTURE_FPS: u32 = 120;
pub const DEFAULT_CAPTURE_WIDTH: u32 = 1920;
pub const DEFAULT_CAPTURE_HEIGHT: u32 = 1080;

pub const DEFAULT_STREAM_FPS: u32 = 15;
pub const DEFAULT_STREAM_WIDTH: u32 = 640;
pub const DEFAULT_STREAM_HEIGHT: u32 = 360;
pub const DEFAULT_JPEG_QUALITY: u8 = 40;

pub const THROUGHPUT_LOG_INTERVAL: Duration = Duration::from_secs(5);

pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);
pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

pub const UPLOAD_MAX_RETRIES: u32 = 3;
pub const UPLOAD_BACKOFF_BASE: Duration = Duration::from_secs(1);
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

pub const DEFAULT_HTTP_PORT: u16 = 3000;
