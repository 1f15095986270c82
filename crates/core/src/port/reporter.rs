// Failure Reporter Port

use crate::domain::ValidationFailure;
use tracing::warn;

/// Sink for failed validations
pub trait FailureReporter: Send + Sync {
    fn report(&self, failure: &ValidationFailure);
}

/// Production reporter: one warning per failure plus the detail block
pub struct TracingReporter;

impl FailureReporter for TracingReporter {
    fn report(&self, failure: &ValidationFailure) {
        warn!(
            document = %failure.document,
            command = %failure.command,
            "{}",
            failure.headline()
        );
        warn!(target: "fencecheck::report", "{}", failure.details());
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Keeps every reported failure in order
    #[derive(Clone, Default)]
    pub struct CollectingReporter {
        failures: Arc<Mutex<Vec<ValidationFailure>>>,
    }

    impl CollectingReporter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failures(&self) -> Vec<ValidationFailure> {
            self.failures.lock().unwrap().clone()
        }

        pub fn commands(&self) -> Vec<String> {
            self.failures()
                .into_iter()
                .map(|f| f.command)
                .collect()
        }
    }

    impl FailureReporter for CollectingReporter {
        fn report(&self, failure: &ValidationFailure) {
            self.failures.lock().unwrap().push(failure.clone());
        }
    }
}
