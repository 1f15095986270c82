// Outcome Domain Model

use super::snippet::DocumentId;
use std::time::Duration;
use thiserror::Error;

/// Resolved result of running one validator command against one snippet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Process exited with status 0
    Success,
    /// Process ran and exited non-zero (or was killed by a signal)
    Failure {
        /// Combined stdout/stderr, lossily decoded
        output: String,
        exit_code: Option<i32>,
    },
    /// Process could not be run at all, or the result never arrived in time
    RunError(RunError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    /// Text shown under "Output" in a failure report, `None` on success
    pub fn report_output(&self) -> Option<String> {
        match self {
            Outcome::Success => None,
            Outcome::Failure { output, .. } => Some(output.trim_end().to_string()),
            Outcome::RunError(e) => Some(e.to_string()),
        }
    }
}

/// Errors that prevent a validator from producing an exit status
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    #[error("Invalid command line: {0}")]
    InvalidCommand(String),

    #[error("Spawn failed: {0}")]
    Spawn(String),

    #[error("Temporary file error: {0}")]
    TempFile(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Validator task panicked: {0}")]
    Panicked(String),

    #[error("Timed out after {0:?} waiting for the validator to finish")]
    Timeout(Duration),
}

/// A failed validation, attributed to its document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub document: DocumentId,
    pub command: String,
    pub source: String,
    pub output: String,
}

impl ValidationFailure {
    /// Build a failure record, `None` when the outcome is a success
    pub fn from_outcome(
        document: impl Into<DocumentId>,
        command: impl Into<String>,
        source: impl Into<String>,
        outcome: &Outcome,
    ) -> Option<Self> {
        outcome.report_output().map(|output| Self {
            document: document.into(),
            command: command.into(),
            source: source.into(),
            output,
        })
    }

    /// First report line
    pub fn headline(&self) -> String {
        format!(
            "In file '{}' a code block failed the check `{}`:",
            self.document, self.command
        )
    }

    /// Multi-line block with the snippet and the captured output
    pub fn details(&self) -> String {
        [
            "-------- Input --------",
            self.source.as_str(),
            "",
            "-------- Output --------",
            self.output.as_str(),
        ]
        .join("\n")
    }
}
