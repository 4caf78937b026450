//! Convene Council use case
//!
//! Orchestrates a full deliberation: proposal collection, optional debate,
//! DWA voting, optional external escalation, and persistence. The use case
//! never returns an error to the caller: a failed workflow produces a
//! finalized session carrying a synthetic error decision, and the session
//! is persisted either way.

use crate::config::CouncilParams;
use crate::ports::consultation::ExternalConsultation;
use crate::ports::expertise_lookup::ExpertiseLookup;
use crate::ports::proposal_source::{ProposalRequest, ProposalSource, SourceError};
use crate::ports::session_store::SessionStore;
use council_domain::{
    CouncilSession, CouncilTrigger, DebateManager, DomainError, Proposal, SessionId,
    SessionSummary, Vote, VotingAggregator, VotingResult,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that terminate the deliberation workflow.
///
/// These never escape [`ConveneCouncilUseCase::convene`]; they become the
/// session's synthetic error decision.
#[derive(Error, Debug)]
pub enum ConveneError {
    #[error("No proposals generated for domain '{0}'")]
    NoProposals(String),

    #[error("Proposal collection timed out")]
    ProposalTimeout,

    #[error("Proposal source error: {0}")]
    Source(#[from] SourceError),

    #[error("Aggregation error: {0}")]
    Aggregation(#[from] DomainError),
}

/// Use case for convening the council on a trigger
pub struct ConveneCouncilUseCase<P, E, C, S>
where
    P: ProposalSource + 'static,
    E: ExpertiseLookup + 'static,
    C: ExternalConsultation + 'static,
    S: SessionStore + 'static,
{
    proposal_source: Arc<P>,
    expertise: Arc<E>,
    consultation: Arc<C>,
    store: Arc<S>,
    debate_manager: DebateManager,
    aggregator: VotingAggregator,
    params: CouncilParams,
}

impl<P, E, C, S> ConveneCouncilUseCase<P, E, C, S>
where
    P: ProposalSource + 'static,
    E: ExpertiseLookup + 'static,
    C: ExternalConsultation + 'static,
    S: SessionStore + 'static,
{
    pub fn new(
        proposal_source: Arc<P>,
        expertise: Arc<E>,
        consultation: Arc<C>,
        store: Arc<S>,
        params: CouncilParams,
    ) -> Self {
        Self {
            proposal_source,
            expertise,
            consultation,
            store,
            debate_manager: DebateManager::new(),
            aggregator: VotingAggregator::default(),
            params,
        }
    }

    /// Override the deliberation components (mainly for tests)
    pub fn with_components(
        mut self,
        debate_manager: DebateManager,
        aggregator: VotingAggregator,
    ) -> Self {
        self.debate_manager = debate_manager;
        self.aggregator = aggregator;
        self
    }

    /// Main entry point: convene the council for a trigger.
    ///
    /// Returns only after the session has been handed to the store. A
    /// workflow failure finalizes the session with an "ERROR: ..."
    /// decision at confidence 0; a store failure is logged and does not
    /// alter the returned session.
    pub async fn convene(
        &self,
        trigger: CouncilTrigger,
        context: Option<String>,
    ) -> CouncilSession {
        let start = Instant::now();
        let mut session = CouncilSession::new(trigger);

        info!(
            session_id = %session.session_id,
            condition = %session.trigger.condition,
            domain = %session.trigger.inferred_domain,
            "Convening council"
        );

        if let Err(e) = self.run_workflow(&mut session, context.as_deref()).await {
            warn!(session_id = %session.session_id, error = %e, "Council workflow failed");
            session.fail(e, 0);
        }

        session.total_duration_ms = Some(start.elapsed().as_millis() as u64);

        if let Err(e) = self.store.save(&session).await {
            warn!(session_id = %session.session_id, error = %e, "Failed to persist session");
        }

        session
    }

    /// Condensed overview of a previously persisted session
    pub async fn summarize(&self, session_id: SessionId) -> Option<SessionSummary> {
        match self.store.load(session_id).await {
            Ok(session) => Some(session.summary()),
            Err(e) => {
                debug!(%session_id, error = %e, "Session lookup failed");
                None
            }
        }
    }

    async fn run_workflow(
        &self,
        session: &mut CouncilSession,
        context: Option<&str>,
    ) -> Result<(), ConveneError> {
        let domain = session.trigger.inferred_domain.clone();
        let operation_text = session.trigger.operation_text.clone();

        // Step 1: collect proposals, bounded by a hard timeout
        let request = ProposalRequest {
            domain: domain.clone(),
            operation_text: operation_text.clone(),
            context: context.map(String::from),
            max_agents: self.params.max_agents,
            min_expertise: self.params.min_expertise,
        };
        let mut proposals = tokio::time::timeout(
            Duration::from_secs(self.params.proposal_timeout_secs),
            self.proposal_source.generate(&request),
        )
        .await
        .map_err(|_| ConveneError::ProposalTimeout)??;

        if proposals.is_empty() {
            return Err(ConveneError::NoProposals(domain));
        }

        session.set_participants(proposals.iter().map(|p| p.agent_name.clone()).collect());
        info!(
            session_id = %session.session_id,
            agents = ?session.participating_agents,
            "Collected {} proposals",
            proposals.len()
        );

        // Step 2: optional debate
        let (should_debate, debate_reason) = self.debate_manager.should_debate(&proposals);
        if should_debate {
            info!(session_id = %session.session_id, reason = %debate_reason, "Debate triggered");
            let rounds = self
                .debate_manager
                .conduct_debate(&proposals, &domain, &operation_text);
            if let Some(last) = rounds.last() {
                proposals = last.proposals.clone();
            }
            for round in rounds {
                session.add_debate_round(round);
            }
            info!(
                session_id = %session.session_id,
                "Completed {} debate round(s)",
                session.debate_rounds.len()
            );
        } else {
            debug!(session_id = %session.session_id, reason = %debate_reason, "Skipping debate");
        }

        // Step 3: one approve-vote per proposal, weighted by the
        // proposing agent's expertise for the domain
        let votes = self.generate_votes(&proposals, &domain).await;

        // Step 4: DWA aggregation
        let voting_result = self
            .aggregator
            .aggregate(&votes, &proposals, session.session_id)?;

        // Step 5: optional external escalation
        if voting_result.needs_escalation {
            self.handle_escalation(session, &proposals, &domain, &operation_text, &voting_result)
                .await;
        }

        // Step 6: decide
        let (decision, confidence) = match self.aggregator.winning_proposal(&voting_result, &proposals)
        {
            Some(winner) => (
                winner.recommendation.clone(),
                voting_result.aggregate_confidence,
            ),
            None => ("No clear winner - manual review required".to_string(), 0.0),
        };
        info!(
            session_id = %session.session_id,
            confidence,
            "Decision: {}",
            council_domain::truncate_str(&decision, 80)
        );

        session.finalize(decision, confidence, voting_result, 0);
        Ok(())
    }

    async fn generate_votes(&self, proposals: &[Proposal], domain: &str) -> Vec<Vote> {
        let mut votes = Vec::with_capacity(proposals.len());
        for proposal in proposals {
            let weight = self.expertise.expertise_of(&proposal.agent_name, domain).await;
            votes.push(
                Vote::approve(
                    proposal.agent_name.clone(),
                    proposal.proposal_id,
                    proposal.confidence,
                    weight,
                )
                .with_rationale(format!(
                    "Own proposal with confidence {:.2}",
                    proposal.confidence
                )),
            );
        }
        votes
    }

    /// Consult the external arbiter. Failure or timeout is soft: logged,
    /// and the workflow proceeds on the existing voting result.
    async fn handle_escalation(
        &self,
        session: &mut CouncilSession,
        proposals: &[Proposal],
        domain: &str,
        operation_text: &str,
        voting_result: &VotingResult,
    ) {
        let reason = voting_result
            .escalation_reason
            .as_deref()
            .unwrap_or("unspecified");
        info!(session_id = %session.session_id, reason, "Escalation needed");
        session.escalated_to_external = true;

        let prompt = build_escalation_prompt(proposals, domain, operation_text, voting_result);
        let preferred = self.params.escalation_model(domain);

        let consult = tokio::time::timeout(
            Duration::from_secs(self.params.consultation_timeout_secs),
            self.consultation.consult(&prompt, preferred),
        )
        .await;

        match consult {
            Ok(Ok(reply)) => {
                info!(
                    session_id = %session.session_id,
                    model = %reply.model,
                    "External consultation: {}",
                    council_domain::truncate_str(&reply.content, 80)
                );
                session.mark_escalated(reply.model);
            }
            Ok(Err(e)) => {
                warn!(session_id = %session.session_id, error = %e, "Escalation failed");
            }
            Err(_) => {
                warn!(session_id = %session.session_id, "External consultation timed out");
            }
        }
    }
}

/// Build the prompt handed to the external arbiter on escalation
fn build_escalation_prompt(
    proposals: &[Proposal],
    domain: &str,
    operation_text: &str,
    voting_result: &VotingResult,
) -> String {
    use std::fmt::Write;

    let reason = voting_result
        .escalation_reason
        .as_deref()
        .unwrap_or("unspecified");

    let mut prompt = format!(
        "You are an expert consultant for a multi-agent council.\n\n\
         **ESCALATION CONTEXT**\n\n\
         Domain: {domain}\n\
         Operation: {operation_text}\n\
         Escalation Reason: {reason}\n\n\
         **PROPOSALS FROM AGENTS**\n\n"
    );

    for (i, proposal) in proposals.iter().enumerate() {
        let reasoning: Vec<&str> = proposal
            .reasoning_chain
            .iter()
            .take(2)
            .map(String::as_str)
            .collect();
        let _ = write!(
            prompt,
            "{}. {} (confidence: {:.2})\n   Recommendation: {}\n   Reasoning: {}...\n",
            i + 1,
            proposal.agent_name,
            proposal.confidence,
            proposal.recommendation,
            reasoning.join(", "),
        );
    }

    let _ = write!(
        prompt,
        "\n**VOTING RESULT**\n\n\
         Aggregate Confidence: {:.2}\n\
         Winner Score: {:.3}\n\
         Needs Escalation: {reason}\n\n\
         **YOUR TASK**\n\n\
         Review the proposals and provide:\n\
         1. Which proposal (if any) you recommend\n\
         2. Why you chose it\n\
         3. What the council should consider\n\
         4. Confidence in your recommendation (0-1)\n\n\
         Be concise but thorough.",
        voting_result.aggregate_confidence, voting_result.winning_score,
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::consultation::{ConsultationError, ConsultationReply};
    use crate::ports::session_store::StoreError;
    use async_trait::async_trait;
    use council_domain::TriggerClassifier;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct ScriptedSource {
        proposals: Vec<Proposal>,
        fail: bool,
    }

    #[async_trait]
    impl ProposalSource for ScriptedSource {
        async fn generate(
            &self,
            _request: &ProposalRequest,
        ) -> Result<Vec<Proposal>, SourceError> {
            if self.fail {
                return Err(SourceError::GenerationFailed("agents offline".to_string()));
            }
            Ok(self.proposals.clone())
        }
    }

    struct MapLookup {
        weights: HashMap<String, f64>,
    }

    #[async_trait]
    impl ExpertiseLookup for MapLookup {
        async fn expertise_of(&self, agent_name: &str, _domain: &str) -> f64 {
            self.weights
                .get(agent_name)
                .copied()
                .unwrap_or(crate::ports::expertise_lookup::DEFAULT_EXPERTISE_WEIGHT)
        }
    }

    struct ScriptedConsultation {
        fail: bool,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl ExternalConsultation for ScriptedConsultation {
        async fn consult(
            &self,
            _prompt: &str,
            preferred_model: Option<&str>,
        ) -> Result<ConsultationReply, ConsultationError> {
            *self.calls.lock().unwrap() += 1;
            if self.fail {
                return Err(ConsultationError::Failed("no arbiter".to_string()));
            }
            Ok(ConsultationReply {
                model: preferred_model.unwrap_or("o3").to_string(),
                content: "Proposal 1 is the sound choice".to_string(),
            })
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        sessions: Mutex<Vec<CouncilSession>>,
        fail_save: bool,
    }

    #[async_trait]
    impl SessionStore for MemoryStore {
        async fn save(&self, session: &CouncilSession) -> Result<(), StoreError> {
            if self.fail_save {
                return Err(StoreError::Io("disk full".to_string()));
            }
            self.sessions.lock().unwrap().push(session.clone());
            Ok(())
        }

        async fn load(&self, session_id: SessionId) -> Result<CouncilSession, StoreError> {
            self.sessions
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.session_id == session_id)
                .cloned()
                .ok_or(StoreError::NotFound(session_id))
        }

        async fn recent(&self, limit: usize) -> Result<Vec<CouncilSession>, StoreError> {
            let mut sessions = self.sessions.lock().unwrap().clone();
            sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            sessions.truncate(limit);
            Ok(sessions)
        }
    }

    fn proposal(agent: &str, recommendation: &str, confidence: f64) -> Proposal {
        Proposal::new(
            agent,
            recommendation,
            vec!["step one".to_string(), "step two".to_string()],
            confidence,
            0.9,
            "sonnet",
        )
        .unwrap()
    }

    fn trigger() -> CouncilTrigger {
        TriggerClassifier::new()
            .classify("Edit", "rotate the oauth token signing key", None)
            .expect("oauth operation triggers the council")
    }

    fn use_case(
        source: ScriptedSource,
        consultation: ScriptedConsultation,
        store: Arc<MemoryStore>,
    ) -> ConveneCouncilUseCase<ScriptedSource, MapLookup, ScriptedConsultation, MemoryStore> {
        let mut weights = HashMap::new();
        weights.insert("security-agent".to_string(), 0.95);
        weights.insert("backend-agent".to_string(), 0.7);
        ConveneCouncilUseCase::new(
            Arc::new(source),
            Arc::new(MapLookup { weights }),
            Arc::new(consultation),
            store,
            CouncilParams::default(),
        )
    }

    #[tokio::test]
    async fn test_high_consensus_decides_without_debate_or_escalation() {
        let source = ScriptedSource {
            proposals: vec![
                proposal("security-agent", "Rotate the key immediately", 0.95),
                proposal("backend-agent", "Rotate the key immediately", 0.9),
                proposal("generalist", "rotate the key immediately", 0.92),
            ],
            fail: false,
        };
        let consultation = ScriptedConsultation { fail: false, calls: Mutex::new(0) };
        let store = Arc::new(MemoryStore::default());
        let uc = use_case(source, consultation, Arc::clone(&store));

        let session = uc.convene(trigger(), None).await;

        assert!(session.is_finalized());
        assert!(!session.is_failed());
        assert_eq!(session.participating_agents.len(), 3);
        assert!(session.debate_rounds.is_empty());
        assert_eq!(
            session.decision.as_deref(),
            Some("Rotate the key immediately")
        );
        assert!(!session.escalated_to_external);
        assert_eq!(store.sessions.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_proposals_fails_session_but_persists() {
        let source = ScriptedSource { proposals: vec![], fail: false };
        let consultation = ScriptedConsultation { fail: false, calls: Mutex::new(0) };
        let store = Arc::new(MemoryStore::default());
        let uc = use_case(source, consultation, Arc::clone(&store));

        let session = uc.convene(trigger(), None).await;

        assert!(session.is_failed());
        let decision = session.decision.as_deref().unwrap();
        assert!(decision.starts_with("ERROR:"));
        assert!(decision.contains("No proposals"));
        assert_eq!(session.decision_confidence, Some(0.0));
        // Failed sessions are still persisted
        assert_eq!(store.sessions.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_source_error_fails_session() {
        let source = ScriptedSource { proposals: vec![], fail: true };
        let consultation = ScriptedConsultation { fail: false, calls: Mutex::new(0) };
        let store = Arc::new(MemoryStore::default());
        let uc = use_case(source, consultation, Arc::clone(&store));

        let session = uc.convene(trigger(), None).await;

        assert!(session.is_failed());
        assert!(session.decision.as_deref().unwrap().contains("agents offline"));
    }

    #[tokio::test]
    async fn test_divergent_proposals_debate_and_escalate() {
        // Distinct recommendations at mixed confidence: debate runs, and
        // the spread-out approvals push HHI below the escalation bar
        let source = ScriptedSource {
            proposals: vec![
                proposal("security-agent", "Rotate the key immediately", 0.6),
                proposal("backend-agent", "Schedule rotation for the weekend", 0.55),
                proposal("generalist", "Audit usage before any rotation", 0.5),
                proposal("devops-agent", "Revoke the key and issue a new one", 0.58),
            ],
            fail: false,
        };
        let consultation = ScriptedConsultation { fail: false, calls: Mutex::new(0) };
        let store = Arc::new(MemoryStore::default());
        let uc = use_case(source, consultation, Arc::clone(&store));

        let session = uc.convene(trigger(), Some("quarterly audit".to_string())).await;

        assert!(!session.debate_rounds.is_empty());
        let result = session.voting_result.as_ref().unwrap();
        assert!(result.needs_escalation);
        assert!(session.escalated_to_external);
        assert_eq!(session.external_model_used.as_deref(), Some("o3"));
        assert!(!session.is_failed());
    }

    #[tokio::test]
    async fn test_majority_recommendation_wins_after_debate() {
        // Two of three agents share a recommendation, so the 2/3 consensus
        // sits below the 0.80 bar and debate runs; the shared text still
        // wins the vote, at the mean of the vote confidences
        let source = ScriptedSource {
            proposals: vec![
                proposal("security-agent", "Rotate the key immediately", 0.90),
                proposal("backend-agent", "Rotate the key immediately", 0.85),
                proposal("generalist", "Audit usage before any rotation", 0.65),
            ],
            fail: false,
        };
        let consultation = ScriptedConsultation { fail: false, calls: Mutex::new(0) };
        let store = Arc::new(MemoryStore::default());
        let uc = use_case(source, consultation, Arc::clone(&store));

        let session = uc.convene(trigger(), None).await;

        assert!(!session.debate_rounds.is_empty());
        assert_eq!(
            session.decision.as_deref(),
            Some("Rotate the key immediately")
        );
        let confidence = session.decision_confidence.unwrap();
        assert!((confidence - 0.80).abs() < 1e-9);
        assert!(!session.escalated_to_external);

        // Every self-vote records its own confidence as the rationale
        let result = session.voting_result.as_ref().unwrap();
        let own = result
            .votes
            .iter()
            .find(|v| v.agent_name == "security-agent")
            .unwrap();
        assert_eq!(
            own.rationale.as_deref(),
            Some("Own proposal with confidence 0.90")
        );
    }

    #[tokio::test]
    async fn test_escalation_routes_critical_domain_to_critical_model() {
        let source = ScriptedSource {
            proposals: vec![
                proposal("security-agent", "Rotate the key immediately", 0.5),
                proposal("backend-agent", "Schedule rotation for the weekend", 0.55),
            ],
            fail: false,
        };
        let consultation = ScriptedConsultation { fail: false, calls: Mutex::new(0) };
        let store = Arc::new(MemoryStore::default());
        let params = CouncilParams {
            critical_external_model: Some("opus".to_string()),
            ..Default::default()
        };
        let uc = ConveneCouncilUseCase::new(
            Arc::new(source),
            Arc::new(MapLookup { weights: HashMap::new() }),
            Arc::new(consultation),
            Arc::clone(&store),
            params,
        );

        let session = uc.convene(trigger(), None).await;

        // Low confidence escalates, and the security domain picks the
        // critical model
        assert!(session.escalated_to_external);
        assert_eq!(session.external_model_used.as_deref(), Some("opus"));
    }

    #[tokio::test]
    async fn test_consultation_failure_is_soft() {
        let source = ScriptedSource {
            proposals: vec![
                proposal("security-agent", "Rotate the key immediately", 0.5),
                proposal("backend-agent", "Schedule rotation for the weekend", 0.55),
            ],
            fail: false,
        };
        let consultation = ScriptedConsultation { fail: true, calls: Mutex::new(0) };
        let store = Arc::new(MemoryStore::default());
        let uc = use_case(source, consultation, Arc::clone(&store));

        let session = uc.convene(trigger(), None).await;

        // Escalation was attempted and failed, but the session completes
        assert!(session.escalated_to_external);
        assert!(session.external_model_used.is_none());
        assert!(session.is_finalized());
        assert!(!session.is_failed());
        assert!(session.decision.is_some());
    }

    #[tokio::test]
    async fn test_store_failure_does_not_alter_session() {
        let source = ScriptedSource {
            proposals: vec![proposal("security-agent", "Rotate the key immediately", 0.95)],
            fail: false,
        };
        let consultation = ScriptedConsultation { fail: false, calls: Mutex::new(0) };
        let store = Arc::new(MemoryStore { fail_save: true, ..Default::default() });
        let uc = use_case(source, consultation, Arc::clone(&store));

        let session = uc.convene(trigger(), None).await;

        assert!(session.is_finalized());
        assert!(!session.is_failed());
        assert_eq!(
            session.decision.as_deref(),
            Some("Rotate the key immediately")
        );
    }

    #[tokio::test]
    async fn test_summarize_round_trip() {
        let source = ScriptedSource {
            proposals: vec![proposal("security-agent", "Rotate the key immediately", 0.95)],
            fail: false,
        };
        let consultation = ScriptedConsultation { fail: false, calls: Mutex::new(0) };
        let store = Arc::new(MemoryStore::default());
        let uc = use_case(source, consultation, Arc::clone(&store));

        let session = uc.convene(trigger(), None).await;
        let summary = uc.summarize(session.session_id).await.unwrap();

        assert_eq!(summary.session_id, session.session_id);
        assert_eq!(summary.domain, "security");
        assert_eq!(summary.decision.as_deref(), Some("Rotate the key immediately"));

        let missing = uc.summarize(SessionId::new()).await;
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_votes_use_expertise_weights() {
        let source = ScriptedSource {
            proposals: vec![
                proposal("security-agent", "Rotate the key immediately", 0.9),
                proposal("unknown-agent", "Rotate the key immediately", 0.9),
            ],
            fail: false,
        };
        let consultation = ScriptedConsultation { fail: false, calls: Mutex::new(0) };
        let store = Arc::new(MemoryStore::default());
        let uc = use_case(source, consultation, Arc::clone(&store));

        let session = uc.convene(trigger(), None).await;
        let result = session.voting_result.as_ref().unwrap();

        let by_agent: HashMap<&str, f64> = result
            .votes
            .iter()
            .map(|v| (v.agent_name.as_str(), v.expertise_weight))
            .collect();
        assert_eq!(by_agent["security-agent"], 0.95);
        // Unregistered agents fall back to the neutral default
        assert_eq!(by_agent["unknown-agent"], 0.5);
    }
}
