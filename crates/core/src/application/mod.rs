// Application Layer - Validation engine use cases

pub mod cache;
pub mod coordinator;
pub mod dispatcher;
pub mod handle;
pub mod result_queue;

// Re-exports
pub use cache::{CacheLookup, ValidationCache};
pub use coordinator::Coordinator;
pub use dispatcher::Dispatcher;
pub use handle::{OutcomeHandle, OutcomeSlot, Resolution};
pub use result_queue::{PendingEntry, ResultQueue};
