//! DWA voting aggregation
//!
//! Computes weighted proposal scores (`Σ approval × confidence × expertise`),
//! consensus statistics (mean confidence, approve-vote HHI), tie detection,
//! and the escalation decision.
//!
//! Determinism: scores live in a `BTreeMap` keyed by proposal id, and the
//! winner scan uses strictly-greater comparison over that ordering, so equal
//! top scores always resolve to the lexicographically smallest proposal id.

use crate::core::error::DomainError;
use crate::core::ids::{ProposalId, SessionId};
use crate::council::proposal::Proposal;
use crate::council::vote::{Vote, VotingResult};
use crate::util::current_timestamp;
use std::collections::BTreeMap;

/// DWA voting aggregator with escalation thresholds
#[derive(Debug, Clone)]
pub struct VotingAggregator {
    /// Minimum aggregate confidence before escalation
    pub confidence_threshold: f64,
    /// Relative score window counting as a tie
    pub tie_threshold: f64,
    /// Minimum HHI before escalation for high disagreement
    pub hhi_threshold: f64,
}

impl Default for VotingAggregator {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.7,
            tie_threshold: 0.05,
            hhi_threshold: 0.3,
        }
    }
}

impl VotingAggregator {
    /// Create an aggregator with explicit thresholds
    pub fn new(confidence_threshold: f64, tie_threshold: f64, hhi_threshold: f64) -> Self {
        Self {
            confidence_threshold,
            tie_threshold,
            hhi_threshold,
        }
    }

    /// Aggregate votes using the DWA formula and determine the winner.
    ///
    /// Fails with [`DomainError::EmptyVotes`] when no votes were cast. The
    /// winning id is cross-checked against `proposals`: a top-scoring id
    /// with no matching proposal leaves `winning_proposal_id` unset while
    /// `winning_score` still records the top score.
    pub fn aggregate(
        &self,
        votes: &[Vote],
        proposals: &[Proposal],
        session_id: SessionId,
    ) -> Result<VotingResult, DomainError> {
        if votes.is_empty() {
            return Err(DomainError::EmptyVotes);
        }

        let proposal_scores = compute_dwa_scores(votes);

        // Strictly-greater scan over the ordered map: equal top scores
        // resolve to the smallest proposal id.
        let (mut winning_id, mut winning_score) = (None, f64::NEG_INFINITY);
        for (id, score) in &proposal_scores {
            if *score > winning_score {
                winning_id = Some(*id);
                winning_score = *score;
            }
        }
        let winning_proposal_id =
            winning_id.filter(|id| proposals.iter().any(|p| p.proposal_id == *id));

        let aggregate_confidence = mean_confidence(votes);
        let vote_concentration_hhi = compute_hhi(votes);
        let is_tie = self.check_tie(&proposal_scores, winning_score);

        let (needs_escalation, escalation_reason) =
            self.check_escalation(aggregate_confidence, is_tie, vote_concentration_hhi);

        Ok(VotingResult {
            session_id,
            created_at: current_timestamp(),
            votes: votes.to_vec(),
            proposal_scores,
            winning_proposal_id,
            winning_score,
            aggregate_confidence,
            vote_concentration_hhi,
            is_tie,
            needs_escalation,
            escalation_reason,
        })
    }

    /// Retrieve the winning proposal from a voting result
    pub fn winning_proposal<'a>(
        &self,
        result: &VotingResult,
        proposals: &'a [Proposal],
    ) -> Option<&'a Proposal> {
        let winning_id = result.winning_proposal_id?;
        proposals.iter().find(|p| p.proposal_id == winning_id)
    }

    /// Tie when the runner-up is within `tie_threshold` (relative) of the
    /// winner. Fewer than two scored proposals is never a tie.
    fn check_tie(&self, scores: &BTreeMap<ProposalId, f64>, winning_score: f64) -> bool {
        if scores.len() < 2 {
            return false;
        }

        let mut sorted: Vec<f64> = scores.values().copied().collect();
        sorted.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));
        let second_score = sorted[1];

        (winning_score - second_score) <= self.tie_threshold * winning_score
    }

    /// Collect escalation reasons; each names the threshold comparison that
    /// produced it, joined with "; ".
    fn check_escalation(
        &self,
        aggregate_confidence: f64,
        is_tie: bool,
        hhi: f64,
    ) -> (bool, Option<String>) {
        let mut reasons = Vec::new();

        if aggregate_confidence < self.confidence_threshold {
            reasons.push(format!(
                "Low confidence ({aggregate_confidence:.2} < {})",
                self.confidence_threshold
            ));
        }

        if is_tie {
            reasons.push(format!(
                "Tie vote (within {:.0}%)",
                self.tie_threshold * 100.0
            ));
        }

        if hhi < self.hhi_threshold {
            reasons.push(format!(
                "High disagreement (HHI {hhi:.2} < {})",
                self.hhi_threshold
            ));
        }

        if reasons.is_empty() {
            (false, None)
        } else {
            (true, Some(reasons.join("; ")))
        }
    }
}

/// Per-proposal DWA score: sum of weighted scores of votes targeting it
fn compute_dwa_scores(votes: &[Vote]) -> BTreeMap<ProposalId, f64> {
    let mut scores: BTreeMap<ProposalId, f64> = BTreeMap::new();
    for vote in votes {
        *scores.entry(vote.proposal_id).or_insert(0.0) += vote.weighted_score();
    }
    scores
}

/// Arithmetic mean of vote confidences (not score-weighted)
fn mean_confidence(votes: &[Vote]) -> f64 {
    if votes.is_empty() {
        return 0.0;
    }
    votes.iter().map(|v| v.confidence).sum::<f64>() / votes.len() as f64
}

/// Herfindahl-Hirschman Index over approve votes only.
///
/// 1.0 means every approval targets one proposal (full consensus); values
/// near 0 mean approvals are spread thin. Zero approvals is defined as 0.0
/// (maximal-disagreement convention, not the mathematical limit).
fn compute_hhi(votes: &[Vote]) -> f64 {
    let mut approve_counts: BTreeMap<ProposalId, usize> = BTreeMap::new();
    let mut total_approvals = 0usize;

    for vote in votes.iter().filter(|v| v.is_approval()) {
        *approve_counts.entry(vote.proposal_id).or_insert(0) += 1;
        total_approvals += 1;
    }

    if total_approvals == 0 {
        return 0.0;
    }

    approve_counts
        .values()
        .map(|count| {
            let share = *count as f64 / total_approvals as f64;
            share * share
        })
        .sum()
}
