//! Registry-backed expertise lookup adapter

use async_trait::async_trait;
use council_application::ports::expertise_lookup::{DEFAULT_EXPERTISE_WEIGHT, ExpertiseLookup};
use council_domain::ExpertiseRegistry;
use std::sync::Arc;

/// Resolves expertise weights from an in-memory [`ExpertiseRegistry`].
///
/// Unknown agents and unknown domains both resolve to the neutral default
/// weight, keeping the lookup infallible.
pub struct RegistryLookup {
    registry: Arc<ExpertiseRegistry>,
}

impl RegistryLookup {
    pub fn new(registry: Arc<ExpertiseRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl ExpertiseLookup for RegistryLookup {
    async fn expertise_of(&self, agent_name: &str, domain: &str) -> f64 {
        self.registry
            .get(agent_name)
            .map(|p| p.expertise_or(domain, DEFAULT_EXPERTISE_WEIGHT))
            .unwrap_or(DEFAULT_EXPERTISE_WEIGHT)
    }
}
