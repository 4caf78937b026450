//! Council deliberation domain
//!
//! The deliberation pipeline runs in three stages, all pure and
//! deterministic:
//!
//! 1. **Trigger classification** ([`trigger`]): decides whether an
//!    operation warrants convening the council at all.
//! 2. **Debate** ([`debate`]): bounded critique rounds that refine the
//!    proposal set when confidence or consensus is low.
//! 3. **Voting** ([`aggregator`]): debate-weighted aggregation of approval
//!    votes, with tie detection and escalation flagging.
//!
//! A [`session::CouncilSession`] records one full pass through the
//! pipeline; orchestration and I/O live in the layers above.

pub mod aggregator;
pub mod debate;
pub mod proposal;
pub mod session;
pub mod trigger;
pub mod vote;

// Re-export main types
pub use aggregator::VotingAggregator;
pub use debate::{ConfidenceGapCritic, CritiqueStrategy, DebateManager, DebateRound};
pub use proposal::{Critique, CritiqueSeverity, Proposal};
pub use session::{CouncilSession, SessionSummary};
pub use trigger::{CouncilTrigger, RiskLevel, TriggerClassifier, TriggerCondition};
pub use vote::{Vote, VoteType, VotingResult};
