//! Agent expertise profiles and the in-memory registry.
//!
//! Expertise weights drive two things: agent selection for a deliberation
//! (relevance queries) and the expertise factor of the DWA vote formula.

pub mod profile;
pub mod registry;

pub use profile::{CouncilRole, ExpertiseProfile};
pub use registry::ExpertiseRegistry;
