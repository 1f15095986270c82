// Time Provider Port (for run timing in logs)

/// Wall-clock source, injected so durations can be asserted in tests
pub trait TimeProvider: Send + Sync {
    /// Get current time in milliseconds since epoch
    fn now_millis(&self) -> i64;

    /// Milliseconds elapsed since `start_millis` (never negative)
    fn elapsed_millis(&self, start_millis: i64) -> i64 {
        (self.now_millis() - start_millis).max(0)
    }
}

/// System time provider (production)
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

pub mod mocks {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// Clock that advances a fixed step on every read
    pub struct SteppingTimeProvider {
        now: AtomicI64,
        step: i64,
    }

    impl SteppingTimeProvider {
        pub fn new(start: i64, step: i64) -> Self {
            Self {
                now: AtomicI64::new(start),
                step,
            }
        }
    }

    impl TimeProvider for SteppingTimeProvider {
        fn now_millis(&self) -> i64 {
            self.now.fetch_add(self.step, Ordering::SeqCst)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::SteppingTimeProvider;
    use super::*;

    #[test]
    fn test_elapsed_uses_clock() {
        let clock = SteppingTimeProvider::new(1_000, 25);
        let start = clock.now_millis();
        assert_eq!(clock.elapsed_millis(start), 25);
    }

    #[test]
    fn test_elapsed_clamped() {
        let clock = SteppingTimeProvider::new(1_000, 0);
        assert_eq!(clock.elapsed_millis(5_000), 0);
    }
}
