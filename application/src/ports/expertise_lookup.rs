//! Expertise lookup port
//!
//! Supplies the expertise factor of the DWA vote formula. The lookup is
//! infallible: unknown agents or domains get the neutral default weight.

use async_trait::async_trait;

/// Neutral weight for agents or domains the lookup does not know
pub const DEFAULT_EXPERTISE_WEIGHT: f64 = 0.5;

/// Resolves an agent's expertise weight for a domain
#[async_trait]
pub trait ExpertiseLookup: Send + Sync {
    /// Weight in [0,1]; [`DEFAULT_EXPERTISE_WEIGHT`] when unknown
    async fn expertise_of(&self, agent_name: &str, domain: &str) -> f64;
}
