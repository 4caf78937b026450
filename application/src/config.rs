//! Application-level deliberation parameters.

use serde::{Deserialize, Serialize};

/// Domains whose escalation routes to the critical external model
const CRITICAL_ESCALATION_DOMAINS: &[&str] = &["security", "architecture", "ethics"];

/// Tunable parameters for a council deliberation.
///
/// These are policy knobs, not infrastructure settings: how many agents to
/// fan out to, how selective to be, and how long to wait on external
/// collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CouncilParams {
    /// Maximum agents asked for proposals
    pub max_agents: usize,
    /// Minimum expertise weight for an agent to be selected
    pub min_expertise: f64,
    /// Per-agent proposal generation timeout
    pub proposal_timeout_secs: u64,
    /// External consultation timeout
    pub consultation_timeout_secs: u64,
    /// Preferred external model for escalation; None lets the
    /// consultation adapter auto-select
    pub preferred_external_model: Option<String>,
    /// External model for escalations in critical domains (security,
    /// architecture, ethics); falls back to the preferred model
    pub critical_external_model: Option<String>,
}

impl CouncilParams {
    /// External model to request when escalating a deliberation in `domain`
    pub fn escalation_model(&self, domain: &str) -> Option<&str> {
        if CRITICAL_ESCALATION_DOMAINS.contains(&domain) {
            return self
                .critical_external_model
                .as_deref()
                .or(self.preferred_external_model.as_deref());
        }
        self.preferred_external_model.as_deref()
    }
}

impl Default for CouncilParams {
    fn default() -> Self {
        Self {
            max_agents: 5,
            min_expertise: 0.5,
            proposal_timeout_secs: 30,
            consultation_timeout_secs: 60,
            preferred_external_model: None,
            critical_external_model: None,
        }
    }
}
