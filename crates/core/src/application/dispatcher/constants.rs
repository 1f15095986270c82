// Dispatcher constants (No magic values)
use std::time::Duration;

/// Default worker pool size for external validator processes
pub const DEFAULT_WORKERS: usize = 5;

/// Default per-entry wait bound for the blocking drain (seconds)
pub const DEFAULT_DRAIN_TIMEOUT_SECS: u64 = 300;

/// Default per-entry wait bound for the blocking drain
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(DEFAULT_DRAIN_TIMEOUT_SECS);
