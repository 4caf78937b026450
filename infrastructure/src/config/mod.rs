//! Configuration loading (TOML files merged via figment)

pub mod file_config;
pub mod loader;

pub use file_config::{
    ConfigValidationError, FileAgentsConfig, FileConfig, FileConsultationConfig,
    FileProposalsConfig, FileStorageConfig,
};
pub use loader::ConfigLoader;
