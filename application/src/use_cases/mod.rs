//! Use cases (application services)

pub mod convene_council;

pub use convene_council::{ConveneCouncilUseCase, ConveneError};
