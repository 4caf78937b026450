//! Proposal source port
//!
//! Defines how the application layer obtains proposals from council
//! agents. Implementations (adapters) live in the infrastructure layer.

use async_trait::async_trait;
use council_domain::Proposal;
use thiserror::Error;

/// Errors that can occur during proposal generation
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Agent '{0}' is not registered")]
    UnknownAgent(String),

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Invalid proposal from '{agent}': {reason}")]
    InvalidProposal { agent: String, reason: String },

    #[error("Timeout")]
    Timeout,

    #[error("Other error: {0}")]
    Other(String),
}

/// Request for a round of proposals
#[derive(Debug, Clone)]
pub struct ProposalRequest {
    /// Inferred domain of the operation (e.g. "security")
    pub domain: String,
    /// Text of the operation under deliberation
    pub operation_text: String,
    /// Additional context for the agents
    pub context: Option<String>,
    /// Upper bound on participating agents
    pub max_agents: usize,
    /// Minimum expertise weight for agent selection
    pub min_expertise: f64,
}

/// Source of agent proposals for a deliberation.
///
/// A source may return fewer proposals than `max_agents`: agents whose
/// generation failed are omitted, not fatal. Returning an empty list is
/// valid and leaves the zero-proposal handling to the caller.
#[async_trait]
pub trait ProposalSource: Send + Sync {
    async fn generate(&self, request: &ProposalRequest) -> Result<Vec<Proposal>, SourceError>;
}
