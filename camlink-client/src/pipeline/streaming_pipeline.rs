use crate::capture::{CapturedFrame, FrameSink};
use crate::channel::SignalingChannel;
use crate::pipeline::{FrameEncoder, JpegFrameEncoder, StreamSettings, ThroughputMeter};
use bytes::Bytes;
use camlink_core::utils::THROUGHPUT_LOG_INTERVAL;
use image::RgbImage;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

/// Where encoded preview frames go.
pub trait FrameTransport: Send + Sync {
    fn send_frame(&self, frame: Bytes) -> bool;
}

impl FrameTransport for SignalingChannel {
    fn send_frame(&self, frame: Bytes) -> bool {
        self.send_binary(frame)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub captured: u64,
    /// Frames the sampler picked.
    pub eligible: u64,
    pub sent: u64,
    /// Picked frames skipped because the previous one was still in flight.
    pub dropped: u64,
    /// Encode or send failures.
    pub failed: u64,
}

struct PipelineInner {
    settings: RwLock<StreamSettings>,
    encoder: Arc<dyn FrameEncoder>,
    transport: Arc<dyn FrameTransport>,
    runtime: Handle,
    in_flight: AtomicBool,
    captured: AtomicU64,
    eligible: AtomicU64,
    sent: AtomicU64,
    dropped: AtomicU64,
    failed: AtomicU64,
    meter: Mutex<ThroughputMeter>,
}

/// Clears the in-flight flag however processing ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl PipelineInner {
    fn encode_and_send(&self, image: &RgbImage, settings: &StreamSettings) {
        let jpeg = match self.encoder.encode(image, settings) {
            Ok(jpeg) => jpeg,
            Err(e) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                warn!("Frame encoding failed: {}", e);
                return;
            }
        };

        let size = jpeg.len();
        if !self.transport.send_frame(jpeg) {
            self.failed.fetch_add(1, Ordering::Relaxed);
            debug!("Frame of {} bytes not sent", size);
            return;
        }

        let sent = self.sent.fetch_add(1, Ordering::Relaxed) + 1;
        let rate = self
            .meter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(Instant::now());
        if let Some(fps) = rate {
            info!(
                "Streaming {:.1} fps ({} sent, {} dropped, last frame {} bytes)",
                fps,
                sent,
                self.dropped.load(Ordering::Relaxed),
                size
            );
        }
    }
}

/// Downsamples captured frames, compresses them and pushes them out with
/// at most one frame in flight.
#[derive(Clone)]
pub struct FrameStreamingPipeline {
    inner: Arc<PipelineInner>,
}

impl FrameStreamingPipeline {
    /// Must be called from within a Tokio runtime; encoding runs on its
    /// blocking pool.
    pub fn new(settings: StreamSettings, transport: Arc<dyn FrameTransport>) -> Self {
        Self::with_encoder(settings, Arc::new(JpegFrameEncoder), transport)
    }

    pub fn with_encoder(
        settings: StreamSettings,
        encoder: Arc<dyn FrameEncoder>,
        transport: Arc<dyn FrameTransport>,
    ) -> Self {
        Self {
            inner: Arc::new(PipelineInner {
                settings: RwLock::new(settings),
                encoder,
                transport,
                runtime: Handle::current(),
                in_flight: AtomicBool::new(false),
                captured: AtomicU64::new(0),
                eligible: AtomicU64::new(0),
                sent: AtomicU64::new(0),
                dropped: AtomicU64::new(0),
                failed: AtomicU64::new(0),
                meter: Mutex::new(ThroughputMeter::new(THROUGHPUT_LOG_INTERVAL, Instant::now())),
            }),
        }
    }

    pub fn settings(&self) -> StreamSettings {
        *self
            .inner
            .settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies from the next captured frame on.
    pub fn update_settings(&self, update: impl FnOnce(&mut StreamSettings)) {
        let mut settings = self
            .inner
            .settings
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        update(&mut *settings);
        info!(
            "Stream settings: {} of {} fps, {}x{}, quality {}",
            settings.target_fps,
            settings.capture_fps,
            settings.max_width,
            settings.max_height,
            settings.jpeg_quality
        );
    }

    pub fn set_target_fps(&self, fps: u32) {
        self.update_settings(|s| s.target_fps = fps);
    }

    pub fn set_resolution(&self, width: u32, height: u32) {
        self.update_settings(|s| {
            s.max_width = width;
            s.max_height = height;
        });
    }

    pub fn set_quality(&self, quality: u8) {
        self.update_settings(|s| s.jpeg_quality = quality.clamp(1, 100));
    }

    pub fn is_busy(&self) -> bool {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> PipelineStats {
        let i = &self.inner;
        PipelineStats {
            captured: i.captured.load(Ordering::Relaxed),
            eligible: i.eligible.load(Ordering::Relaxed),
            sent: i.sent.load(Ordering::Relaxed),
            dropped: i.dropped.load(Ordering::Relaxed),
            failed: i.failed.load(Ordering::Relaxed),
        }
    }

    /// Restarts frame numbering and clears the counters.
    pub fn reset(&self) {
        let i = &self.inner;
        for counter in [&i.captured, &i.eligible, &i.sent, &i.dropped, &i.failed] {
            counter.store(0, Ordering::Relaxed);
        }
        i.meter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .reset(Instant::now());
        debug!("Streaming pipeline reset");
    }

    /// Returns true when the frame was handed to the encoder.
    pub fn process(&self, frame: &CapturedFrame) -> bool {
        let inner = &self.inner;
        let n = inner.captured.fetch_add(1, Ordering::Relaxed) + 1;
        let settings = self.settings();

        if !settings
            .sampling
            .admits(n, settings.capture_fps, settings.target_fps)
        {
            return false;
        }
        inner.eligible.fetch_add(1, Ordering::Relaxed);

        if inner
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            inner.dropped.fetch_add(1, Ordering::Relaxed);
            debug!("Frame {} dropped, previous frame still in flight", n);
            return false;
        }

        let worker = inner.clone();
        let image = frame.image.clone();
        inner.runtime.spawn_blocking(move || {
            let _in_flight = InFlight(&worker.in_flight);
            worker.encode_and_send(&image, &settings);
        });

        true
    }
}

impl FrameSink for FrameStreamingPipeline {
    fn on_frame(&self, frame: &CapturedFrame) {
        self.process(frame);
    }
}
