//! Agent expertise profiles
//!
//! An [`ExpertiseProfile`] describes one agent's per-domain competence and
//! its role in council deliberation. Weights are kept in `[0, 1]` by
//! clamping at construction.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Agent's role in council deliberation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CouncilRole {
    /// Generates proposals and votes
    Proposer,
    /// Reviews but does not propose
    Reviewer,
    /// Cannot participate; excluded from relevance queries
    Abstainer,
}

impl Default for CouncilRole {
    fn default() -> Self {
        CouncilRole::Proposer
    }
}

impl std::fmt::Display for CouncilRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CouncilRole::Proposer => write!(f, "proposer"),
            CouncilRole::Reviewer => write!(f, "reviewer"),
            CouncilRole::Abstainer => write!(f, "abstainer"),
        }
    }
}

/// Expertise profile for a single agent
///
/// # Example
///
/// ```
/// use council_domain::expertise::{CouncilRole, ExpertiseProfile};
///
/// let profile = ExpertiseProfile::new("security-auditor")
///     .with_weight("security", 1.0)
///     .with_weight("architecture", 0.7);
///
/// assert_eq!(profile.expertise("security"), 1.0);
/// assert_eq!(profile.expertise_or("database", 0.5), 0.5);
/// assert_eq!(profile.role, CouncilRole::Proposer);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpertiseProfile {
    /// Agent name, unique within a registry (e.g. "security-auditor")
    pub name: String,
    /// Domain → weight in [0, 1]
    #[serde(default)]
    pub expertise_weights: HashMap<String, f64>,
    /// Role in council deliberation
    #[serde(default)]
    pub role: CouncilRole,
    /// Model tier backing this agent (e.g. "opus", "sonnet", "haiku")
    #[serde(default = "default_model_tier")]
    pub model_tier: String,
    /// Optional free-text description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

fn default_model_tier() -> String {
    "sonnet".to_string()
}

impl ExpertiseProfile {
    /// Create a new profile with no weights and the default proposer role
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expertise_weights: HashMap::new(),
            role: CouncilRole::default(),
            model_tier: default_model_tier(),
            description: None,
        }
    }

    /// Add a domain weight, clamped to [0, 1]
    pub fn with_weight(mut self, domain: impl Into<String>, weight: f64) -> Self {
        self.expertise_weights
            .insert(domain.into(), weight.clamp(0.0, 1.0));
        self
    }

    /// Set the council role
    pub fn with_role(mut self, role: CouncilRole) -> Self {
        self.role = role;
        self
    }

    /// Set the model tier
    pub fn with_model_tier(mut self, tier: impl Into<String>) -> Self {
        self.model_tier = tier.into();
        self
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Expertise weight for a domain, 0.0 if unknown
    pub fn expertise(&self, domain: &str) -> f64 {
        self.expertise_or(domain, 0.0)
    }

    /// Expertise weight for a domain with an explicit fallback
    pub fn expertise_or(&self, domain: &str, default: f64) -> f64 {
        self.expertise_weights
            .get(domain)
            .copied()
            .unwrap_or(default)
    }

    /// Whether this agent may participate in relevance queries
    pub fn participates(&self) -> bool {
        self.role != CouncilRole::Abstainer
    }
}
