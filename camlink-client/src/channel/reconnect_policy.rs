use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectDecision {
    RetryAfter(Duration),
    GiveUp,
}

/// Fixed-delay retry with a capped attempt counter.
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    delay: Duration,
    max_attempts: u32,
    attempts: u32,
}

impl ReconnectPolicy {
    pub fn new(delay: Duration, max_attempts: u32) -> Self {
        Self {
            delay,
            max_attempts,
            attempts: 0,
        }
    }

    /// Called once per failed connect or dropped connection.
    pub fn on_failure(&mut self) -> ReconnectDecision {
        if self.attempts < self.max_attempts {
            self.attempts += 1;
            ReconnectDecision::RetryAfter(self.delay)
        } else {
            ReconnectDecision::GiveUp
        }
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}
