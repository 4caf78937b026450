//! Domain layer for dwa-council
//!
//! This crate contains the core deliberation logic, entities, and value
//! objects. It has no dependencies on infrastructure or CLI concerns.
//!
//! # Core Concepts
//!
//! ## Council
//!
//! A council is convened when an operation matches a trigger condition
//! (security-sensitive change, architectural decision, quality failure,
//! ...). Selected agents each produce a proposal; the council optionally
//! debates, then votes.
//!
//! ## Debate-Weighted Aggregation (DWA)
//!
//! Each approval vote contributes `confidence x expertise_weight` to its
//! proposal's score. The aggregate also reports vote concentration (HHI)
//! and flags ties and low-confidence outcomes for external escalation.

pub mod core;
pub mod council;
pub mod expertise;
pub mod util;

// Re-export commonly used types
pub use core::{
    error::DomainError,
    ids::{CritiqueId, ProposalId, SessionId, VoteId},
};
pub use council::{
    aggregator::VotingAggregator,
    debate::{ConfidenceGapCritic, CritiqueStrategy, DebateManager, DebateRound},
    proposal::{Critique, CritiqueSeverity, Proposal},
    session::{CouncilSession, SessionSummary},
    trigger::{CouncilTrigger, RiskLevel, TriggerClassifier, TriggerCondition},
    vote::{Vote, VoteType, VotingResult},
};
pub use expertise::{CouncilRole, ExpertiseProfile, ExpertiseRegistry};
pub use util::{current_timestamp, truncate_str};
