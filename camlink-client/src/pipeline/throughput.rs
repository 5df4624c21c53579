use std::time::{Duration, Instant};

/// Counts sent frames and reports the rate once per interval.
#[derive(Debug)]
pub struct ThroughputMeter {
    interval: Duration,
    window_start: Instant,
    frames: u64,
}

impl ThroughputMeter {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            window_start: now,
            frames: 0,
        }
    }

    /// Records one frame; returns frames/second when a window closes.
    pub fn record(&mut self, now: Instant) -> Option<f64> {
        self.frames += 1;

        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.interval {
            return None;
        }

        let fps = self.frames as f64 / elapsed.as_secs_f64();
        self.window_start = now;
        self.frames = 0;
        Some(fps)
    }

    pub fn reset(&mut self, now: Instant) {
        self.window_start = now;
        self.frames = 0;
    }
}
