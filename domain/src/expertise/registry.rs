//! In-memory registry of agent expertise profiles
//!
//! The registry answers relevance queries for agent selection. It holds no
//! I/O; loading profiles from disk is an infrastructure concern.

use super::profile::{CouncilRole, ExpertiseProfile};
use std::collections::HashMap;

/// Registry of agent expertise profiles, keyed by agent name
#[derive(Debug, Clone, Default)]
pub struct ExpertiseRegistry {
    profiles: HashMap<String, ExpertiseProfile>,
}

impl ExpertiseRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a profile, replacing any existing profile with the same name
    pub fn register(&mut self, profile: ExpertiseProfile) {
        self.profiles.insert(profile.name.clone(), profile);
    }

    /// Look up a profile by agent name
    pub fn get(&self, agent_name: &str) -> Option<&ExpertiseProfile> {
        self.profiles.get(agent_name)
    }

    /// Agents with expertise in `domain` at or above `min_weight`, sorted by
    /// weight descending (name ascending as a deterministic secondary key).
    ///
    /// Abstainers never appear in the result.
    pub fn relevant_agents(&self, domain: &str, min_weight: f64) -> Vec<&ExpertiseProfile> {
        let mut relevant: Vec<&ExpertiseProfile> = self
            .profiles
            .values()
            .filter(|p| p.participates())
            .filter(|p| p.expertise(domain) >= min_weight)
            .collect();

        relevant.sort_by(|a, b| {
            b.expertise(domain)
                .partial_cmp(&a.expertise(domain))
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
        });

        relevant
    }

    /// All agents with the proposer role, name-sorted
    pub fn proposers(&self) -> Vec<&ExpertiseProfile> {
        let mut proposers: Vec<&ExpertiseProfile> = self
            .profiles
            .values()
            .filter(|p| p.role == CouncilRole::Proposer)
            .collect();
        proposers.sort_by(|a, b| a.name.cmp(&b.name));
        proposers
    }

    /// All unique domains across registered profiles, sorted
    pub fn domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = self
            .profiles
            .values()
            .flat_map(|p| p.expertise_weights.keys().cloned())
            .collect();
        domains.sort();
        domains.dedup();
        domains
    }

    /// Names of all registered agents, sorted
    pub fn agent_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.profiles.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered agents
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_registry() -> ExpertiseRegistry {
        let mut registry = ExpertiseRegistry::new();
        registry.register(
            ExpertiseProfile::new("security-auditor")
                .with_weight("security", 1.0)
                .with_weight("architecture", 0.7),
        );
        registry.register(
            ExpertiseProfile::new("api-designer")
                .with_weight("security", 0.6)
                .with_weight("api_design", 0.9),
        );
        registry.register(
            ExpertiseProfile::new("doc-writer")
                .with_weight("security", 0.9)
                .with_role(CouncilRole::Abstainer),
        );
        registry
    }

    #[test]
    fn test_relevant_agents_sorted_by_weight() {
        let registry = sample_registry();
        let relevant = registry.relevant_agents("security", 0.5);

        assert_eq!(relevant.len(), 2);
        assert_eq!(relevant[0].name, "security-auditor");
        assert_eq!(relevant[1].name, "api-designer");
    }

    #[test]
    fn test_abstainers_excluded_from_relevance() {
        let registry = sample_registry();
        let relevant = registry.relevant_agents("security", 0.5);
        assert!(relevant.iter().all(|p| p.name != "doc-writer"));
    }

    #[test]
    fn test_min_weight_filters() {
        let registry = sample_registry();
        let relevant = registry.relevant_agents("security", 0.8);
        assert_eq!(relevant.len(), 1);
        assert_eq!(relevant[0].name, "security-auditor");
    }

    #[test]
    fn test_equal_weights_break_by_name() {
        let mut registry = ExpertiseRegistry::new();
        registry.register(ExpertiseProfile::new("beta").with_weight("x", 0.8));
        registry.register(ExpertiseProfile::new("alpha").with_weight("x", 0.8));

        let relevant = registry.relevant_agents("x", 0.5);
        assert_eq!(relevant[0].name, "alpha");
        assert_eq!(relevant[1].name, "beta");
    }

    #[test]
    fn test_domains_collected() {
        let registry = sample_registry();
        let domains = registry.domains();
        assert_eq!(domains, vec!["api_design", "architecture", "security"]);
    }

    #[test]
    fn test_proposers_excludes_other_roles() {
        let registry = sample_registry();
        let proposers = registry.proposers();
        assert_eq!(proposers.len(), 2);
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = ExpertiseRegistry::new();
        registry.register(ExpertiseProfile::new("a").with_weight("x", 0.2));
        registry.register(ExpertiseProfile::new("a").with_weight("x", 0.9));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("a").unwrap().expertise("x"), 0.9);
    }
}
