// Central Error Type for the Application

use thiserror::Error;

/// Application-level error type
///
/// Only configuration-time and lifecycle errors live here. Per-snippet
/// failures are carried inside `Outcome` and never abort a run.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
