//! External consultation port
//!
//! Invoked only when a voting result flags escalation: a single call to an
//! external arbiter model, bounded by a caller-imposed timeout.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during external consultation
#[derive(Error, Debug)]
pub enum ConsultationError {
    #[error("Consultation failed: {0}")]
    Failed(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// Response from an external arbiter
#[derive(Debug, Clone)]
pub struct ConsultationReply {
    /// Model that produced the recommendation
    pub model: String,
    /// Recommendation text
    pub content: String,
}

/// External arbiter for escalated deliberations
#[async_trait]
pub trait ExternalConsultation: Send + Sync {
    /// Consult the arbiter with a fully built prompt.
    ///
    /// `preferred_model` is advisory; None lets the adapter auto-select.
    async fn consult(
        &self,
        prompt: &str,
        preferred_model: Option<&str>,
    ) -> Result<ConsultationReply, ConsultationError>;
}
