// Process Runner Port
// Abstraction for running one validator command against one snippet

use crate::domain::Outcome;
use async_trait::async_trait;

/// Placeholder token requesting temp-file invocation instead of stdin
pub const INPUT_PLACEHOLDER: &str = "$<";

/// Process Runner trait
///
/// Implementations:
/// - SubprocessRunner (infra-system): spawns the external command
/// - MockProcessRunner: scripted outcomes for tests
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `command_line` against `content` and wait for it to finish
    ///
    /// Never fails: spawn and IO problems come back as `Outcome::RunError`.
    async fn run(&self, content: &str, command_line: &str) -> Outcome;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Mock runner behaviour for one command
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Exit 0
        Success,
        /// Exit non-zero with output
        Fail(String),
        /// Sleep, then behave like the inner behaviour
        Delay(Duration, Box<MockBehavior>),
    }

    /// Mock Process Runner for testing
    ///
    /// Commands without a scripted behaviour succeed.
    #[derive(Clone, Default)]
    pub struct MockProcessRunner {
        behaviors: Arc<Mutex<HashMap<String, MockBehavior>>>,
        calls: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl MockProcessRunner {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_behavior(self, command: impl Into<String>, behavior: MockBehavior) -> Self {
            self.behaviors
                .lock()
                .unwrap()
                .insert(command.into(), behavior);
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        /// (content, command) pairs in invocation order
        pub fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProcessRunner for MockProcessRunner {
        async fn run(&self, content: &str, command_line: &str) -> Outcome {
            self.calls
                .lock()
                .unwrap()
                .push((content.to_string(), command_line.to_string()));

            let mut behavior = self
                .behaviors
                .lock()
                .unwrap()
                .get(command_line)
                .cloned()
                .unwrap_or(MockBehavior::Success);

            loop {
                match behavior {
                    MockBehavior::Success => return Outcome::Success,
                    MockBehavior::Fail(output) => {
                        return Outcome::Failure {
                            output,
                            exit_code: Some(1),
                        }
                    }
                    MockBehavior::Delay(delay, inner) => {
                        tokio::time::sleep(delay).await;
                        behavior = *inner;
                    }
                }
            }
        }
    }
}
