//! Offline proposal source for demos and smoke tests
//!
//! Produces deterministic proposals from the registry without spawning
//! any agent process: high-expertise agents endorse the operation, the
//! rest ask for more analysis. Useful for exercising the full workflow
//! (debate, voting, escalation) with no models installed.

use async_trait::async_trait;
use council_application::ports::proposal_source::{ProposalRequest, ProposalSource, SourceError};
use council_domain::{ExpertiseRegistry, Proposal};
use std::sync::Arc;
use tracing::debug;

/// Expertise at or above this endorses the operation outright
const ENDORSE_THRESHOLD: f64 = 0.8;

pub struct DemoProposalSource {
    registry: Arc<ExpertiseRegistry>,
}

impl DemoProposalSource {
    pub fn new(registry: Arc<ExpertiseRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl ProposalSource for DemoProposalSource {
    async fn generate(&self, request: &ProposalRequest) -> Result<Vec<Proposal>, SourceError> {
        let agents = self
            .registry
            .relevant_agents(&request.domain, request.min_expertise);

        let mut proposals = Vec::new();
        for agent in agents.into_iter().take(request.max_agents) {
            let weight = agent.expertise(&request.domain);
            let (recommendation, confidence) = if weight >= ENDORSE_THRESHOLD {
                (
                    format!("Proceed with the operation under {} review", request.domain),
                    0.55 + 0.4 * weight,
                )
            } else {
                (
                    format!("Defer the operation pending further {} analysis", request.domain),
                    0.45 + 0.3 * weight,
                )
            };

            let proposal = Proposal::new(
                agent.name.clone(),
                recommendation,
                vec![
                    format!("Operation touches the {} domain", request.domain),
                    format!("{} weighs in at expertise {:.2}", agent.name, weight),
                    "Demo reasoning, no model was consulted".to_string(),
                ],
                confidence,
                weight,
                "demo",
            )
            .map_err(|e| SourceError::InvalidProposal {
                agent: agent.name.clone(),
                reason: e.to_string(),
            })?;
            proposals.push(proposal);
        }

        debug!(domain = %request.domain, count = proposals.len(), "Demo proposals generated");
        Ok(proposals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expertise::default_registry;

    #[tokio::test]
    async fn test_demo_proposals_are_deterministic() {
        let source = DemoProposalSource::new(Arc::new(default_registry()));
        let request = ProposalRequest {
            domain: "security".to_string(),
            operation_text: "rotate signing key".to_string(),
            context: None,
            max_agents: 5,
            min_expertise: 0.5,
        };

        let first = source.generate(&request).await.unwrap();
        let second = source.generate(&request).await.unwrap();

        assert!(!first.is_empty());
        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.agent_name, b.agent_name);
            assert_eq!(a.recommendation, b.recommendation);
            assert_eq!(a.confidence, b.confidence);
        }
    }

    #[tokio::test]
    async fn test_experts_endorse_others_defer() {
        let source = DemoProposalSource::new(Arc::new(default_registry()));
        let request = ProposalRequest {
            domain: "security".to_string(),
            operation_text: "rotate signing key".to_string(),
            context: None,
            max_agents: 5,
            min_expertise: 0.4,
        };

        let proposals = source.generate(&request).await.unwrap();
        let auditor = proposals
            .iter()
            .find(|p| p.agent_name == "security-auditor")
            .unwrap();
        assert!(auditor.recommendation.starts_with("Proceed"));
        assert!(
            proposals
                .iter()
                .filter(|p| p.agent_name != "security-auditor")
                .all(|p| p.recommendation.starts_with("Defer"))
        );
    }
}
