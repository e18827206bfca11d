// Minimum visible-loading duration
use crate::application::constants::DEFAULT_MIN_SPLASH_DURATION;
use std::time::Duration;
use tokio::time::sleep;

/// Resolves after a fixed delay, whatever else is going on.
///
/// Joined next to the bootstrap tasks so the status surface never flashes
/// for a few milliseconds and disappears.
#[derive(Debug, Clone, Copy)]
pub struct MinimumDurationGate {
    duration: Duration,
}

impl MinimumDurationGate {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub async fn wait(&self) {
        sleep(self.duration).await;
    }
}

impl Default for MinimumDurationGate {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_SPLASH_DURATION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_gate_waits_full_duration() {
        let gate = MinimumDurationGate::new(Duration::from_millis(800));
        let start = Instant::now();
        gate.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(800));
    }

    #[test]
    fn test_default_duration() {
        assert_eq!(
            MinimumDurationGate::default().duration(),
            Duration::from_millis(800)
        );
    }
}
