//! Council session entity
//!
//! A session records one full deliberation: why it was convened, which
//! agents participated, the debate rounds, the voting outcome, and the
//! final decision. Sessions are finalized exactly once; a failed workflow
//! still finalizes with a synthetic error decision so that callers always
//! receive a complete, persistable session.

use crate::core::ids::SessionId;
use crate::council::debate::DebateRound;
use crate::council::trigger::CouncilTrigger;
use crate::council::vote::VotingResult;
use crate::util::current_timestamp;
use serde::{Deserialize, Serialize};

/// Complete council deliberation session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouncilSession {
    /// Unique session id
    pub session_id: SessionId,
    /// Creation time (milliseconds since epoch)
    pub created_at: u64,
    /// Completion time, set on finalize
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<u64>,
    /// Why the council was convened
    pub trigger: CouncilTrigger,
    /// Agents selected for this council
    pub participating_agents: Vec<String>,
    /// Debate rounds (0-2), append-only
    pub debate_rounds: Vec<DebateRound>,
    /// Final voting outcome
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voting_result: Option<VotingResult>,
    /// Final council decision
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<String>,
    /// Aggregate confidence in the decision (0-1)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_confidence: Option<f64>,
    /// Total time from trigger to decision
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_duration_ms: Option<u64>,
    /// Whether the session was escalated to an external model
    pub escalated_to_external: bool,
    /// External model consulted, if escalated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_model_used: Option<String>,
}

impl CouncilSession {
    /// Allocate a new session for a trigger, with no agents yet
    pub fn new(trigger: CouncilTrigger) -> Self {
        Self {
            session_id: SessionId::new(),
            created_at: current_timestamp(),
            completed_at: None,
            trigger,
            participating_agents: Vec::new(),
            debate_rounds: Vec::new(),
            voting_result: None,
            decision: None,
            decision_confidence: None,
            total_duration_ms: None,
            escalated_to_external: false,
            external_model_used: None,
        }
    }

    /// Record the agents that contributed proposals
    pub fn set_participants(&mut self, agents: Vec<String>) {
        self.participating_agents = agents;
    }

    /// Append a debate round
    pub fn add_debate_round(&mut self, round: DebateRound) {
        self.debate_rounds.push(round);
    }

    /// Record an external-model consultation
    pub fn mark_escalated(&mut self, model: impl Into<String>) {
        self.escalated_to_external = true;
        self.external_model_used = Some(model.into());
    }

    /// Mark the session complete with its decision and voting outcome
    pub fn finalize(
        &mut self,
        decision: impl Into<String>,
        confidence: f64,
        voting_result: VotingResult,
        duration_ms: u64,
    ) {
        self.completed_at = Some(current_timestamp());
        self.decision = Some(decision.into());
        self.decision_confidence = Some(confidence.clamp(0.0, 1.0));
        self.voting_result = Some(voting_result);
        self.total_duration_ms = Some(duration_ms);
    }

    /// Mark the session failed, preserving whatever fields were already
    /// populated. The synthetic decision keeps the session persistable.
    pub fn fail(&mut self, error: impl std::fmt::Display, duration_ms: u64) {
        self.completed_at = Some(current_timestamp());
        self.decision = Some(format!("ERROR: {error}"));
        self.decision_confidence = Some(0.0);
        self.total_duration_ms = Some(duration_ms);
    }

    /// Whether finalize or fail has been called
    pub fn is_finalized(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Whether the workflow ended in a synthetic error decision
    pub fn is_failed(&self) -> bool {
        self.decision
            .as_deref()
            .is_some_and(|d| d.starts_with("ERROR:"))
    }

    /// Condensed overview for listings and audits
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id,
            created_at: self.created_at,
            trigger_condition: self.trigger.condition.to_string(),
            domain: self.trigger.inferred_domain.clone(),
            agents: self.participating_agents.clone(),
            debate_round_count: self.debate_rounds.len(),
            decision: self.decision.clone(),
            confidence: self.decision_confidence,
            duration_ms: self.total_duration_ms,
            escalated: self.escalated_to_external,
        }
    }
}

/// Condensed session overview
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: SessionId,
    pub created_at: u64,
    pub trigger_condition: String,
    pub domain: String,
    pub agents: Vec<String>,
    pub debate_round_count: usize,
    pub decision: Option<String>,
    pub confidence: Option<f64>,
    pub duration_ms: Option<u64>,
    pub escalated: bool,
}
