//! Votes and aggregated voting results
//!
//! This module defines the voting primitives of Debate-Weighted Aggregation
//! (DWA): each vote contributes `approval × confidence × expertise weight`
//! to its target proposal's score.

use crate::core::ids::{ProposalId, SessionId, VoteId};
use crate::util::current_timestamp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Types of votes in the DWA system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    /// Vote for this recommendation
    Approve,
    /// Vote against
    Reject,
    /// No opinion
    Abstain,
}

/// A single vote in DWA aggregation
///
/// # Example
///
/// ```
/// use council_domain::council::{Vote, VoteType};
/// use council_domain::core::ids::ProposalId;
///
/// let target = ProposalId::new();
/// let vote = Vote::approve("security-auditor", target, 0.9, 1.0);
/// assert!((vote.weighted_score() - 0.9).abs() < 1e-9);
///
/// let reject = Vote::new("api-designer", target, VoteType::Reject, 0.9, 1.0);
/// assert_eq!(reject.weighted_score(), 0.0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    /// Unique vote id
    pub vote_id: VoteId,
    /// Voting agent
    pub agent_name: String,
    /// Proposal being voted on
    pub proposal_id: ProposalId,
    /// Creation time (milliseconds since epoch)
    pub created_at: u64,
    /// Approve / Reject / Abstain
    pub vote_type: VoteType,
    /// Voter's confidence (0-1)
    pub confidence: f64,
    /// Voter's domain expertise (0-1)
    pub expertise_weight: f64,
    /// Why this vote was cast
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl Vote {
    /// Create a new vote; confidence and expertise are clamped to [0, 1]
    pub fn new(
        agent_name: impl Into<String>,
        proposal_id: ProposalId,
        vote_type: VoteType,
        confidence: f64,
        expertise_weight: f64,
    ) -> Self {
        Self {
            vote_id: VoteId::new(),
            agent_name: agent_name.into(),
            proposal_id,
            created_at: current_timestamp(),
            vote_type,
            confidence: confidence.clamp(0.0, 1.0),
            expertise_weight: expertise_weight.clamp(0.0, 1.0),
            rationale: None,
        }
    }

    /// Create an approval vote
    pub fn approve(
        agent_name: impl Into<String>,
        proposal_id: ProposalId,
        confidence: f64,
        expertise_weight: f64,
    ) -> Self {
        Self::new(
            agent_name,
            proposal_id,
            VoteType::Approve,
            confidence,
            expertise_weight,
        )
    }

    /// Add a rationale to the vote
    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }

    /// DWA formula: approval × confidence × expertise weight.
    ///
    /// Reject and abstain votes contribute nothing to a proposal's score.
    pub fn weighted_score(&self) -> f64 {
        let vote_value = match self.vote_type {
            VoteType::Approve => 1.0,
            VoteType::Reject | VoteType::Abstain => 0.0,
        };
        vote_value * self.confidence * self.expertise_weight
    }

    /// Whether this is an approval vote
    pub fn is_approval(&self) -> bool {
        self.vote_type == VoteType::Approve
    }
}

/// Aggregated voting results with winner and statistics.
///
/// Computed once per session by the aggregator; immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingResult {
    /// Council session this result belongs to
    pub session_id: SessionId,
    /// Creation time (milliseconds since epoch)
    pub created_at: u64,
    /// All votes cast
    pub votes: Vec<Vote>,
    /// Proposal id → weighted DWA score (ordered map: deterministic
    /// enumeration, smallest id first)
    pub proposal_scores: BTreeMap<ProposalId, f64>,
    /// Winning proposal, if one could be determined
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winning_proposal_id: Option<ProposalId>,
    /// Winner's DWA score
    pub winning_score: f64,
    /// Mean confidence across votes (0-1)
    pub aggregate_confidence: f64,
    /// Herfindahl-Hirschman Index of approve-vote concentration (0-1)
    pub vote_concentration_hhi: f64,
    /// Whether the top scores are within the tie window
    pub is_tie: bool,
    /// Whether the result must be escalated to an external arbiter
    pub needs_escalation: bool,
    /// Why escalation is needed, if it is
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escalation_reason: Option<String>,
}
