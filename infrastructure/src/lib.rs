//! Infrastructure layer for dwa-council
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer, plus configuration file loading.

pub mod config;
pub mod consultation;
pub mod expertise;
pub mod proposals;
pub mod store;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileAgentsConfig, FileConfig, FileConsultationConfig,
    FileProposalsConfig, FileStorageConfig,
};
pub use consultation::CommandConsultation;
pub use expertise::{ProfileError, RegistryLookup, default_registry, load_profiles};
pub use proposals::{CommandProposalSource, DemoProposalSource};
pub use store::{InMemorySessionStore, JsonlSessionStore};
