use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};
use webrtc::media::Sample;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// Feeds encoded H.264 samples into the video track of one peer connection.
///
/// A new capturer is handed out on every peer setup; samples pushed into a
/// capturer from an older setup go nowhere once that connection is closed.
#[derive(Clone)]
pub struct VideoCapturer {
    generation: u64,
    tx: mpsc::Sender<Sample>,
    written: Arc<AtomicU64>,
    dropped: Arc<AtomicU64>,
}

impl VideoCapturer {
    pub(crate) fn spawn(
        track: Arc<TrackLocalStaticSample>,
        generation: u64,
        capacity: usize,
    ) -> Self {
        let (tx, mut rx) = mpsc::channel::<Sample>(capacity.max(1));
        let written = Arc::new(AtomicU64::new(0));

        let counter = written.clone();
        tokio::spawn(async move {
            while let Some(sample) = rx.recv().await {
                match track.write_sample(&sample).await {
                    Ok(()) => {
                        counter.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(e) => warn!("Track write failed (generation {}): {}", generation, e),
                }
            }
            debug!("Video capturer {} finished", generation);
        });

        Self {
            generation,
            tx,
            written,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Non-blocking; a full queue drops the sample.
    pub fn push_sample(&self, data: Bytes, duration: Duration) -> bool {
        let sample = Sample {
            data,
            duration,
            ..Default::default()
        };

        match self.tx.try_send(sample) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Closed(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn samples_written(&self) -> u64 {
        self.written.load(Ordering::Relaxed)
    }

    pub fn samples_dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
