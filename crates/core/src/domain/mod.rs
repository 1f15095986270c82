// Domain Layer - Pure business logic and entities

pub mod engine_state;
pub mod error;
pub mod kind;
pub mod outcome;
pub mod request;
pub mod snippet;

// Re-exports
pub use engine_state::EngineState;
pub use error::DomainError;
pub use kind::{KindConfig, KindId};
pub use outcome::{Outcome, RunError, ValidationFailure};
pub use request::{CacheKey, ValidationRequest};
pub use snippet::{DocumentId, Snippet, NOCHECK_MARKER};
