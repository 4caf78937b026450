//! Agent profile loading and expertise lookup adapters

pub mod lookup;
pub mod profiles;

pub use lookup::RegistryLookup;
pub use profiles::{ProfileError, default_registry, load_profiles};
