//! Proposals and critiques
//!
//! A [`Proposal`] is an immutable recommendation from one agent, carrying a
//! reasoning chain and two scores: the agent's confidence and the relevance
//! of the recommendation to the agent's expertise domain. Debate refinement
//! produces new `Proposal` values; nothing mutates one after creation.

use crate::core::error::DomainError;
use crate::core::ids::{CritiqueId, ProposalId};
use crate::util::current_timestamp;
use serde::{Deserialize, Serialize};

/// Minimum recommendation length, in characters
const MIN_RECOMMENDATION_LEN: usize = 10;

/// Agent recommendation with reasoning chain and confidence scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    /// Unique proposal id
    pub proposal_id: ProposalId,
    /// Agent that generated this proposal
    pub agent_name: String,
    /// Creation time (milliseconds since epoch)
    pub created_at: u64,
    /// Recommended action or decision
    pub recommendation: String,
    /// Step-by-step reasoning behind the recommendation
    pub reasoning_chain: Vec<String>,
    /// Confidence in this recommendation (0-1)
    pub confidence: f64,
    /// Relevance to the agent's expertise domain (0-1)
    pub domain_relevance: f64,
    /// Model used for generation (e.g. "llama3.2", "opus")
    pub model_used: String,
    /// Time to generate the proposal, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_time_ms: Option<u64>,
}

impl Proposal {
    /// Create a validated proposal.
    ///
    /// Fails when the recommendation is shorter than 10 characters or the
    /// reasoning chain is empty. Scores are clamped to [0, 1].
    pub fn new(
        agent_name: impl Into<String>,
        recommendation: impl Into<String>,
        reasoning_chain: Vec<String>,
        confidence: f64,
        domain_relevance: f64,
        model_used: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let recommendation = recommendation.into();
        if recommendation.trim().chars().count() < MIN_RECOMMENDATION_LEN {
            return Err(DomainError::InvalidProposal(format!(
                "recommendation must be at least {MIN_RECOMMENDATION_LEN} characters"
            )));
        }
        if reasoning_chain.is_empty() {
            return Err(DomainError::InvalidProposal(
                "reasoning chain must contain at least one step".to_string(),
            ));
        }

        Ok(Self {
            proposal_id: ProposalId::new(),
            agent_name: agent_name.into(),
            created_at: current_timestamp(),
            recommendation,
            reasoning_chain,
            confidence: confidence.clamp(0.0, 1.0),
            domain_relevance: domain_relevance.clamp(0.0, 1.0),
            model_used: model_used.into(),
            generation_time_ms: None,
        })
    }

    /// Record how long generation took
    pub fn with_generation_time(mut self, millis: u64) -> Self {
        self.generation_time_ms = Some(millis);
        self
    }

    /// Confidence weighted by domain relevance
    pub fn weighted_confidence(&self) -> f64 {
        self.confidence * self.domain_relevance
    }
}

/// Severity of a critique
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CritiqueSeverity {
    Minor,
    Moderate,
    Critical,
}

impl std::fmt::Display for CritiqueSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CritiqueSeverity::Minor => write!(f, "minor"),
            CritiqueSeverity::Moderate => write!(f, "moderate"),
            CritiqueSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Critique of another agent's proposal, exchanged during a debate round.
/// Read-only after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Critique {
    /// Unique critique id
    pub critique_id: CritiqueId,
    /// Agent providing the critique
    pub source_agent: String,
    /// Proposal being critiqued
    pub target_proposal_id: ProposalId,
    /// Creation time (milliseconds since epoch)
    pub created_at: u64,
    /// Critique content
    pub critique_text: String,
    /// Suggested changes, in order
    pub suggested_improvements: Vec<String>,
    /// Severity of the critique
    pub severity: CritiqueSeverity,
}

impl Critique {
    /// Create a new critique
    pub fn new(
        source_agent: impl Into<String>,
        target_proposal_id: ProposalId,
        critique_text: impl Into<String>,
        severity: CritiqueSeverity,
    ) -> Self {
        Self {
            critique_id: CritiqueId::new(),
            source_agent: source_agent.into(),
            target_proposal_id,
            created_at: current_timestamp(),
            critique_text: critique_text.into(),
            suggested_improvements: Vec::new(),
            severity,
        }
    }

    /// Add suggested improvements
    pub fn with_improvements(mut self, improvements: Vec<String>) -> Self {
        self.suggested_improvements = improvements;
        self
    }
}
