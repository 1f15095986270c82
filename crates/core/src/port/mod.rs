// Port Layer - Interfaces for external dependencies

pub mod process_runner;
pub mod reporter;
pub mod time_provider;

// Re-exports
pub use process_runner::ProcessRunner;
pub use reporter::{FailureReporter, TracingReporter};
pub use time_provider::TimeProvider;
