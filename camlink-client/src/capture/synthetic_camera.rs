use crate::capture::{CaptureConfig, CaptureDevice, CapturedFrame, FrameSink};
use crate::error::CaptureError;
use crate::pipeline::encode_jpeg;
use async_trait::async_trait;
use image::{Rgb, RgbImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

type RecorderSlot = Option<mpsc::Sender<Arc<RgbImage>>>;

const RECORDING_QUALITY: u8 = 80;
const RECORDER_QUEUE: usize = 32;

struct RunningSession {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

struct Recording {
    path: PathBuf,
    task: JoinHandle<Result<u64, CaptureError>>,
}

/// Test pattern source running at a fixed frame rate.
///
/// Recordings are motion-JPEG: the frames produced while recording,
/// JPEG-encoded and concatenated into one file.
pub struct SyntheticCamera {
    config: CaptureConfig,
    deny_access: bool,
    session: Option<RunningSession>,
    recorder: watch::Sender<RecorderSlot>,
    recording: Option<Recording>,
}

impl SyntheticCamera {
    pub fn new(config: CaptureConfig) -> Self {
        let (recorder, _) = watch::channel(None);
        Self {
            config,
            deny_access: false,
            session: None,
            recorder,
            recording: None,
        }
    }

    /// A camera the user refused access to: every `configure` fails.
    pub fn denied() -> Self {
        Self {
            deny_access: true,
            ..Self::new(CaptureConfig::default())
        }
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }
}

#[async_trait]
impl CaptureDevice for SyntheticCamera {
    async fn configure(&mut self, config: &CaptureConfig) -> Result<(), CaptureError> {
        if self.deny_access {
            return Err(CaptureError::PermissionDenied);
        }
        config.validate()?;
        self.config = *config;
        debug!(
            "Synthetic camera configured: {}x{} @ {} fps",
            config.width, config.height, config.fps
        );
        Ok(())
    }

    async fn start_session(&mut self, sink: Arc<dyn FrameSink>) -> Result<(), CaptureError> {
        if self.deny_access {
            return Err(CaptureError::PermissionDenied);
        }
        self.config.validate()?;
        self.stop_session().await;

        let cancel = CancellationToken::new();
        let task = tokio::spawn(generate(
            self.config,
            sink,
            self.recorder.subscribe(),
            cancel.clone(),
        ));

        self.session = Some(RunningSession { cancel, task });
        info!(
            "Synthetic capture started: {}x{} @ {} fps",
            self.config.width, self.config.height, self.config.fps
        );
        Ok(())
    }

    async fn stop_session(&mut self) {
        if let Some(session) = self.session.take() {
            session.cancel.cancel();
            let _ = session.task.await;
            info!("Synthetic capture stopped");
        }
    }

    async fn start_recording(&mut self, path: &Path) -> Result<(), CaptureError> {
        if self.session.is_none() {
            return Err(CaptureError::NotRunning);
        }
        if self.recording.is_some() {
            return Err(CaptureError::AlreadyRecording);
        }

        let file = tokio::fs::File::create(path).await?;
        let (tx, rx) = mpsc::channel(RECORDER_QUEUE);
        let task = tokio::spawn(record(file, rx));

        self.recorder.send_replace(Some(tx));
        self.recording = Some(Recording {
            path: path.to_path_buf(),
            task,
        });
        info!("Recording to {}", path.display());
        Ok(())
    }

    async fn stop_recording(&mut self) -> Result<Option<PathBuf>, CaptureError> {
        let Some(recording) = self.recording.take() else {
            return Ok(None);
        };

        // Dropping the sender lets the recorder drain and finish.
        self.recorder.send_replace(None);

        let frames = recording
            .task
            .await
            .map_err(|e| CaptureError::Recording(e.to_string()))??;
        info!(
            "Recording finished: {} ({} frames)",
            recording.path.display(),
            frames
        );
        Ok(Some(recording.path))
    }

    fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    fn recording_extension(&self) -> &str {
        "mjpeg"
    }
}

async fn generate(
    config: CaptureConfig,
    sink: Arc<dyn FrameSink>,
    recorder: watch::Receiver<RecorderSlot>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs_f64(1.0 / f64::from(config.fps)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let started = Instant::now();
    let mut index: u64 = 0;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let image = Arc::new(test_pattern(config.width, config.height, index));
        let frame = CapturedFrame {
            image: image.clone(),
            timestamp: started.elapsed(),
            sample: None,
        };
        sink.on_frame(&frame);

        if let Some(tx) = recorder.borrow().as_ref()
            && tx.try_send(image).is_err()
        {
            warn!("Recorder behind, frame {} not recorded", index);
        }

        index += 1;
    }
}

async fn record(
    mut file: tokio::fs::File,
    mut rx: mpsc::Receiver<Arc<RgbImage>>,
) -> Result<u64, CaptureError> {
    let mut frames = 0u64;

    while let Some(image) = rx.recv().await {
        let jpeg = tokio::task::spawn_blocking(move || encode_jpeg(&image, RECORDING_QUALITY))
            .await
            .map_err(|e| CaptureError::Recording(e.to_string()))?
            .map_err(|e| CaptureError::Recording(e.to_string()))?;
        file.write_all(&jpeg).await?;
        frames += 1;
    }

    file.flush().await?;
    Ok(frames)
}

/// Moving gradient; `index` shifts it so consecutive frames differ.
pub fn test_pattern(width: u32, height: u32, index: u64) -> RgbImage {
    let shift = (index % 256) as u32;
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            ((x + shift) % 256) as u8,
            (y % 256) as u8,
            ((x / 8 + y / 8 + shift * 3) % 256) as u8,
        ])
    })
}
