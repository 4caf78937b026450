//! Session persistence port

use async_trait::async_trait;
use council_domain::{CouncilSession, SessionId};
use thiserror::Error;

/// Errors that can occur during session persistence
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Session not found: {0}")]
    NotFound(SessionId),

    #[error("Other error: {0}")]
    Other(String),
}

/// Durable store for finalized council sessions.
///
/// Saves are fire-and-forget from the workflow's point of view: a failed
/// save is logged by the caller and never alters the session it returns.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a session, overwriting any previous save of the same id
    async fn save(&self, session: &CouncilSession) -> Result<(), StoreError>;

    /// Load a session by id
    async fn load(&self, session_id: SessionId) -> Result<CouncilSession, StoreError>;

    /// Most recently created sessions, newest first, bounded by `limit`
    async fn recent(&self, limit: usize) -> Result<Vec<CouncilSession>, StoreError>;
}
