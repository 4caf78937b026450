//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and use application types where
//! appropriate.

use council_application::CouncilParams;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("council.max_agents cannot be 0")]
    InvalidMaxAgents,

    #[error("council.min_expertise must be between 0.0 and 1.0")]
    InvalidMinExpertise,

    #[error("{0}.command cannot be empty")]
    EmptyCommand(&'static str),
}

/// Raw agent profile configuration from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentsConfig {
    /// Directory holding agent profile TOML files; None uses the
    /// built-in profiles
    pub profile_dir: Option<PathBuf>,
}

/// Raw proposal-source configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProposalsConfig {
    /// Command invoked once per agent; receives the proposal prompt on
    /// stdin and must emit proposal JSON on stdout
    pub command: Vec<String>,
    /// Model routed to code-oriented domains
    pub code_model: String,
    /// Model routed to reasoning-heavy domains
    pub reasoning_model: String,
    /// Model for everything else
    pub fast_model: String,
    /// Override for critical domains (security, architecture, ethics);
    /// None falls back to the fast model
    pub critical_model: Option<String>,
}

impl Default for FileProposalsConfig {
    fn default() -> Self {
        Self {
            command: vec!["council-agent".to_string()],
            code_model: "devstral:24b".to_string(),
            reasoning_model: "qwen3-coder:30b".to_string(),
            fast_model: "llama3.2".to_string(),
            critical_model: None,
        }
    }
}

/// Raw consultation configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConsultationConfig {
    /// Command invoked for external escalation; receives the escalation
    /// prompt on stdin and must emit the recommendation on stdout
    pub command: Vec<String>,
}

impl Default for FileConsultationConfig {
    fn default() -> Self {
        Self {
            command: vec!["consult-llm".to_string(), "--format".to_string(), "text".to_string()],
        }
    }
}

/// Raw storage configuration from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStorageConfig {
    /// Path of the session JSONL file; None uses the default under the
    /// platform data directory
    pub sessions_path: Option<PathBuf>,
}

/// Complete configuration loaded from TOML files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Deliberation parameters
    pub council: CouncilParams,
    /// Agent profile sources
    pub agents: FileAgentsConfig,
    /// Proposal source adapter settings
    pub proposals: FileProposalsConfig,
    /// Consultation adapter settings
    pub consultation: FileConsultationConfig,
    /// Persistence settings
    pub storage: FileStorageConfig,
}

impl FileConfig {
    /// Validate ranges and required values
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.council.max_agents == 0 {
            return Err(ConfigValidationError::InvalidMaxAgents);
        }
        if !(0.0..=1.0).contains(&self.council.min_expertise) {
            return Err(ConfigValidationError::InvalidMinExpertise);
        }
        if self.proposals.command.is_empty() {
            return Err(ConfigValidationError::EmptyCommand("proposals"));
        }
        if self.consultation.command.is_empty() {
            return Err(ConfigValidationError::EmptyCommand("consultation"));
        }
        Ok(())
    }
}
