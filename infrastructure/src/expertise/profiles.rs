//! Agent profile loading
//!
//! Profiles live as one TOML file per agent in a profile directory:
//!
//! ```toml
//! name = "security-auditor"
//! role = "proposer"
//! model_tier = "opus"
//!
//! [expertise_weights]
//! security = 0.95
//! backend = 0.6
//! ```
//!
//! Malformed files are logged and skipped so one bad profile never takes
//! the whole registry down. When no profile directory is configured, a
//! built-in default roster is used.

use council_domain::{CouncilRole, ExpertiseProfile, ExpertiseRegistry};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while loading a profile directory
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Cannot read profile directory {path}: {source}")]
    ReadDir {
        path: String,
        source: std::io::Error,
    },
}

/// Load every `*.toml` profile in a directory into a registry.
///
/// Unreadable or malformed files are skipped with a warning; an empty or
/// all-malformed directory yields an empty registry.
pub fn load_profiles(dir: &Path) -> Result<ExpertiseRegistry, ProfileError> {
    let entries = std::fs::read_dir(dir).map_err(|source| ProfileError::ReadDir {
        path: dir.display().to_string(),
        source,
    })?;

    let mut registry = ExpertiseRegistry::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().is_none_or(|ext| ext != "toml") {
            continue;
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                warn!("Cannot read agent profile {}: {}", path.display(), e);
                continue;
            }
        };

        match toml::from_str::<ExpertiseProfile>(&content) {
            Ok(profile) => {
                debug!(agent = %profile.name, "Loaded agent profile");
                registry.register(profile);
            }
            Err(e) => {
                warn!("Malformed agent profile {}: {}", path.display(), e);
            }
        }
    }

    Ok(registry)
}

/// Built-in roster used when no profile directory is configured
pub fn default_registry() -> ExpertiseRegistry {
    let mut registry = ExpertiseRegistry::new();

    registry.register(
        ExpertiseProfile::new("security-auditor")
            .with_weight("security", 0.95)
            .with_weight("backend", 0.6)
            .with_weight("devops", 0.5)
            .with_model_tier("opus")
            .with_description("Reviews authentication, secrets handling, and exposure"),
    );
    registry.register(
        ExpertiseProfile::new("system-architect")
            .with_weight("architecture", 0.95)
            .with_weight("api_design", 0.8)
            .with_weight("database", 0.7)
            .with_description("Owns service boundaries and schema evolution"),
    );
    registry.register(
        ExpertiseProfile::new("backend-engineer")
            .with_weight("backend", 0.9)
            .with_weight("api_design", 0.7)
            .with_weight("database", 0.65)
            .with_weight("performance", 0.6),
    );
    registry.register(
        ExpertiseProfile::new("quality-reviewer")
            .with_weight("testing", 0.9)
            .with_weight("general", 0.6)
            .with_role(CouncilRole::Reviewer)
            .with_model_tier("haiku"),
    );
    registry.register(
        ExpertiseProfile::new("generalist")
            .with_weight("general", 0.7)
            .with_weight("frontend", 0.55)
            .with_weight("devops", 0.55)
            .with_model_tier("haiku"),
    );

    registry
}
