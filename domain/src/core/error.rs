//! Domain error types

use thiserror::Error;

/// Domain-level errors
///
/// These are input errors: fatal to the current call, surfaced to the
/// caller, never retried. Collaborator and workflow failures are modelled
/// in the application layer.
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Cannot aggregate an empty vote list")]
    EmptyVotes,

    #[error("Invalid proposal: {0}")]
    InvalidProposal(String),

    #[error("Invalid trigger: {0}")]
    InvalidTrigger(String),
}

impl DomainError {
    /// Check if this error was caused by an empty vote set
    pub fn is_empty_votes(&self) -> bool {
        matches!(self, DomainError::EmptyVotes)
    }
}
