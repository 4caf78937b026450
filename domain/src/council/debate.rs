//! Debate consensus control
//!
//! Debate is optional and bounded: at most two rounds, entered only when the
//! initial proposal set shows low confidence, high confidence variance, or
//! low recommendation consensus. Critique generation sits behind the
//! [`CritiqueStrategy`] trait; the default [`ConfidenceGapCritic`] is a
//! structural stand-in that flags large confidence gaps between proposals.

use crate::council::proposal::{Critique, CritiqueSeverity, Proposal};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Single round of debate with proposals and critiques. Rounds are
/// append-only on a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateRound {
    /// Round number (1-indexed)
    pub round_number: u32,
    /// Proposal set evaluated in this round (refined output)
    pub proposals: Vec<Proposal>,
    /// Critiques exchanged
    pub critiques: Vec<Critique>,
    /// Fraction of proposals sharing the most common recommendation (0-1)
    pub consensus_score: f64,
    /// Whether another round is warranted
    pub should_continue: bool,
}

/// Pluggable critique generation.
///
/// A real implementation would ask each agent's model to critique its
/// peers' proposals; the engine only requires this signature.
pub trait CritiqueStrategy: Send + Sync {
    /// Produce critiques for the current proposal set.
    ///
    /// `previous` carries the prior round's critiques as context when
    /// running round two.
    fn generate(
        &self,
        proposals: &[Proposal],
        domain: &str,
        operation_text: &str,
        previous: Option<&[Critique]>,
    ) -> Vec<Critique>;
}

/// Default critique policy: for every ordered pair of distinct proposals,
/// emit a critique when the confidence gap exceeds 0.2 (moderate below a
/// 0.4 gap, critical at or above it). O(N²) fan-out, acceptable while N is
/// bounded by max_agents.
#[derive(Debug, Clone, Default)]
pub struct ConfidenceGapCritic;

impl CritiqueStrategy for ConfidenceGapCritic {
    fn generate(
        &self,
        proposals: &[Proposal],
        _domain: &str,
        _operation_text: &str,
        _previous: Option<&[Critique]>,
    ) -> Vec<Critique> {
        let mut critiques = Vec::new();

        for (i, proposer) in proposals.iter().enumerate() {
            for (j, other) in proposals.iter().enumerate() {
                if i == j {
                    continue;
                }

                let gap = (proposer.confidence - other.confidence).abs();
                if gap > 0.2 {
                    let severity = if gap < 0.4 {
                        CritiqueSeverity::Moderate
                    } else {
                        CritiqueSeverity::Critical
                    };

                    let critique = Critique::new(
                        proposer.agent_name.clone(),
                        other.proposal_id,
                        format!(
                            "{} disagrees with {}'s approach",
                            proposer.agent_name, other.agent_name
                        ),
                        severity,
                    )
                    .with_improvements(vec![
                        "Consider alternative approach".to_string(),
                        "Review security implications".to_string(),
                    ]);
                    critiques.push(critique);
                }
            }
        }

        critiques
    }
}

/// Manages optional debate rounds for proposal refinement
pub struct DebateManager {
    /// Minimum consensus to skip (or stop) debating
    pub consensus_threshold: f64,
    /// Minimum mean confidence to skip debating
    pub confidence_threshold: f64,
    /// Maximum debate rounds
    pub max_rounds: u32,
    critic: Box<dyn CritiqueStrategy>,
}

impl Default for DebateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DebateManager {
    /// Create a manager with default thresholds and the confidence-gap critic
    pub fn new() -> Self {
        Self {
            consensus_threshold: 0.80,
            confidence_threshold: 0.85,
            max_rounds: 2,
            critic: Box::new(ConfidenceGapCritic),
        }
    }

    /// Override the thresholds
    pub fn with_thresholds(mut self, consensus: f64, confidence: f64, max_rounds: u32) -> Self {
        self.consensus_threshold = consensus;
        self.confidence_threshold = confidence;
        self.max_rounds = max_rounds;
        self
    }

    /// Swap in a different critique strategy
    pub fn with_critic(mut self, critic: Box<dyn CritiqueStrategy>) -> Self {
        self.critic = critic;
        self
    }

    /// Decide whether debate is needed for the initial proposal set.
    ///
    /// Checks, in order: proposal count, mean confidence, confidence
    /// variance, pairwise-distinct recommendations, consensus ratio.
    pub fn should_debate(&self, proposals: &[Proposal]) -> (bool, String) {
        if proposals.len() < 2 {
            return (false, "Only one proposal - no debate needed".to_string());
        }

        let confidences: Vec<f64> = proposals.iter().map(|p| p.confidence).collect();
        let mean = confidences.iter().sum::<f64>() / confidences.len() as f64;
        if mean < self.confidence_threshold {
            return (
                true,
                format!("Low confidence ({mean:.2} < {})", self.confidence_threshold),
            );
        }

        // Population variance over the confidence values
        let variance = confidences
            .iter()
            .map(|c| (c - mean) * (c - mean))
            .sum::<f64>()
            / confidences.len() as f64;
        if variance > 0.05 {
            return (true, format!("High disagreement (variance: {variance:.3})"));
        }

        let (most_common, distinct) = recommendation_groups(proposals);
        if distinct == proposals.len() {
            return (true, "All proposals differ - need discussion".to_string());
        }

        let consensus = most_common as f64 / proposals.len() as f64;
        if consensus < self.consensus_threshold {
            return (
                true,
                format!("Low consensus ({consensus:.2} < {})", self.consensus_threshold),
            );
        }

        (false, format!("High consensus ({consensus:.2}) - no debate needed"))
    }

    /// Run bounded debate rounds.
    ///
    /// Round one always runs; round two runs only when round one signals
    /// continuation, reusing its refined proposals and passing its critiques
    /// as context. The final round never signals continuation past
    /// `max_rounds`.
    pub fn conduct_debate(
        &self,
        proposals: &[Proposal],
        domain: &str,
        operation_text: &str,
    ) -> Vec<DebateRound> {
        let mut rounds = Vec::new();

        let round1 = self.conduct_round(1, proposals, domain, operation_text, None);
        rounds.push(round1);

        if rounds[0].should_continue && (rounds.len() as u32) < self.max_rounds {
            let prior = rounds[0].clone();
            let round2 = self.conduct_round(
                2,
                &prior.proposals,
                domain,
                operation_text,
                Some(&prior.critiques),
            );
            rounds.push(round2);
        }

        rounds
    }

    fn conduct_round(
        &self,
        round_number: u32,
        proposals: &[Proposal],
        domain: &str,
        operation_text: &str,
        previous_critiques: Option<&[Critique]>,
    ) -> DebateRound {
        let critiques = self
            .critic
            .generate(proposals, domain, operation_text, previous_critiques);

        // Refinement extension point: the core keeps the input set as-is.
        // A model-backed refiner would produce new Proposal values here.
        let refined = proposals.to_vec();

        let consensus_score = calculate_consensus(&refined);
        let should_continue =
            consensus_score < self.consensus_threshold && round_number < self.max_rounds;

        DebateRound {
            round_number,
            proposals: refined,
            critiques,
            consensus_score,
            should_continue,
        }
    }
}

impl std::fmt::Debug for DebateManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebateManager")
            .field("consensus_threshold", &self.consensus_threshold)
            .field("confidence_threshold", &self.confidence_threshold)
            .field("max_rounds", &self.max_rounds)
            .finish_non_exhaustive()
    }
}

/// Count of the most common normalized recommendation and the number of
/// distinct recommendations
fn recommendation_groups(proposals: &[Proposal]) -> (usize, usize) {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for proposal in proposals {
        *counts.entry(proposal.recommendation.to_lowercase()).or_insert(0) += 1;
    }
    let most_common = counts.values().copied().max().unwrap_or(0);
    (most_common, counts.len())
}

/// Consensus = share of proposals agreeing with the most common
/// recommendation; a lone proposal is full consensus
fn calculate_consensus(proposals: &[Proposal]) -> f64 {
    if proposals.len() < 2 {
        return 1.0;
    }
    let (most_common, _) = recommendation_groups(proposals);
    most_common as f64 / proposals.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal(agent: &str, recommendation: &str, confidence: f64) -> Proposal {
        Proposal::new(
            agent,
            recommendation,
            vec!["reasoning step".to_string()],
            confidence,
            1.0,
            "sonnet",
        )
        .unwrap()
    }

    #[test]
    fn test_single_proposal_skips_debate() {
        let manager = DebateManager::new();
        let proposals = vec![proposal("a", "Adopt the proposed schema", 0.9)];

        let (debate, reason) = manager.should_debate(&proposals);
        assert!(!debate);
        assert!(reason.contains("one proposal"));
    }

    #[test]
    fn test_low_mean_confidence_triggers_debate() {
        let manager = DebateManager::new();
        let proposals = vec![
            proposal("a", "Adopt the proposed schema", 0.7),
            proposal("b", "Adopt the proposed schema", 0.75),
        ];

        let (debate, reason) = manager.should_debate(&proposals);
        assert!(debate);
        assert!(reason.contains("Low confidence"));
    }

    #[test]
    fn test_high_variance_triggers_debate() {
        let manager = DebateManager::new();
        // mean 0.8625 clears the confidence bar; population variance
        // 3 * 0.55^2 / 16 ≈ 0.0567 exceeds 0.05
        let proposals = vec![
            proposal("a", "Adopt the proposed schema", 1.0),
            proposal("b", "Adopt the proposed schema", 1.0),
            proposal("c", "Adopt the proposed schema", 1.0),
            proposal("d", "Adopt the proposed schema", 0.45),
        ];

        let (debate, reason) = manager.should_debate(&proposals);
        assert!(debate, "reason: {reason}");
        assert!(reason.contains("variance"), "reason: {reason}");
    }

    #[test]
    fn test_all_distinct_recommendations_trigger_debate() {
        let manager = DebateManager::new();
        let proposals = vec![
            proposal("a", "Use Postgres for this", 0.9),
            proposal("b", "Use SQLite for this", 0.9),
            proposal("c", "Use a flat file here", 0.9),
        ];

        let (debate, reason) = manager.should_debate(&proposals);
        assert!(debate);
        assert!(reason.contains("differ"));
    }

    #[test]
    fn test_low_consensus_triggers_debate() {
        let manager = DebateManager::new();
        // 2/4 share a recommendation → consensus 0.5 < 0.8
        let proposals = vec![
            proposal("a", "Use Postgres for this", 0.9),
            proposal("b", "Use Postgres for this", 0.9),
            proposal("c", "Use SQLite for this", 0.9),
            proposal("d", "Use SQLite for this", 0.9),
        ];

        let (debate, reason) = manager.should_debate(&proposals);
        assert!(debate);
        assert!(reason.contains("Low consensus"));
    }

    #[test]
    fn test_high_consensus_skips_debate() {
        let manager = DebateManager::new();
        let proposals = vec![
            proposal("a", "Use Postgres for this", 0.9),
            proposal("b", "Use Postgres for this", 0.92),
            proposal("c", "Use Postgres for this", 0.88),
            proposal("d", "use postgres for this", 0.9),
            proposal("e", "Use SQLite for this", 0.9),
        ];

        let (debate, reason) = manager.should_debate(&proposals);
        assert!(!debate, "reason: {reason}");
        assert!(reason.contains("High consensus"));
        assert!(reason.contains("0.80"));
    }

    #[test]
    fn test_normalization_is_case_insensitive() {
        let manager = DebateManager::new();
        let proposals = vec![
            proposal("a", "Use Postgres for this", 0.9),
            proposal("b", "USE POSTGRES FOR THIS", 0.9),
        ];

        let (debate, _) = manager.should_debate(&proposals);
        assert!(!debate);
    }

    #[test]
    fn test_debate_runs_two_rounds_on_low_consensus() {
        let manager = DebateManager::new();
        let proposals = vec![
            proposal("a", "Use Postgres for this", 0.9),
            proposal("b", "Use SQLite for this", 0.6),
            proposal("c", "Use a flat file here", 0.85),
        ];

        let rounds = manager.conduct_debate(&proposals, "database", "choose a database");

        assert_eq!(rounds.len(), 2);
        assert_eq!(rounds[0].round_number, 1);
        assert!(rounds[0].should_continue);
        assert_eq!(rounds[1].round_number, 2);
        // Round two is final regardless of its own consensus
        assert!(!rounds[1].should_continue);
    }

    #[test]
    fn test_debate_stops_after_one_round_on_consensus() {
        let manager = DebateManager::new();
        let proposals = vec![
            proposal("a", "Use Postgres for this", 0.9),
            proposal("b", "Use Postgres for this", 0.6),
        ];

        let rounds = manager.conduct_debate(&proposals, "database", "choose a database");

        assert_eq!(rounds.len(), 1);
        assert!((rounds[0].consensus_score - 1.0).abs() < 1e-9);
        assert!(!rounds[0].should_continue);
    }

    #[test]
    fn test_round_consensus_ratio() {
        let manager = DebateManager::new();
        let proposals = vec![
            proposal("a", "Use Postgres for this", 0.9),
            proposal("b", "Use Postgres for this", 0.85),
            proposal("c", "Use SQLite for this", 0.65),
        ];

        let rounds = manager.conduct_debate(&proposals, "database", "choose a database");
        assert!((rounds[0].consensus_score - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_gap_critic_severity() {
        let critic = ConfidenceGapCritic;
        let proposals = vec![
            proposal("a", "Use Postgres for this", 0.95),
            proposal("b", "Use SQLite for this", 0.65), // gap 0.30 → moderate
            proposal("c", "Use a flat file here", 0.50), // gap to a: 0.45 → critical
        ];

        let critiques = critic.generate(&proposals, "database", "choose", None);

        let a_on_b = critiques
            .iter()
            .find(|c| c.source_agent == "a" && c.target_proposal_id == proposals[1].proposal_id)
            .unwrap();
        assert_eq!(a_on_b.severity, CritiqueSeverity::Moderate);

        let a_on_c = critiques
            .iter()
            .find(|c| c.source_agent == "a" && c.target_proposal_id == proposals[2].proposal_id)
            .unwrap();
        assert_eq!(a_on_c.severity, CritiqueSeverity::Critical);

        // b vs c gap is 0.15 → no critique either way
        assert!(
            !critiques
                .iter()
                .any(|c| c.source_agent == "b"
                    && c.target_proposal_id == proposals[2].proposal_id)
        );
    }

    #[test]
    fn test_critique_fan_out_is_bounded() {
        let critic = ConfidenceGapCritic;
        let proposals: Vec<Proposal> = (0..4)
            .map(|i| {
                proposal(
                    &format!("agent-{i}"),
                    &format!("Distinct recommendation {i}"),
                    if i % 2 == 0 { 0.95 } else { 0.5 },
                )
            })
            .collect();

        let critiques = critic.generate(&proposals, "general", "op", None);
        assert!(critiques.len() <= proposals.len() * (proposals.len() - 1));
    }
}
