//! Application layer for dwa-council
//!
//! This crate contains the convene use case, port definitions, and
//! deliberation parameters. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::CouncilParams;
pub use ports::{
    consultation::{ConsultationError, ConsultationReply, ExternalConsultation},
    expertise_lookup::{DEFAULT_EXPERTISE_WEIGHT, ExpertiseLookup},
    proposal_source::{ProposalRequest, ProposalSource, SourceError},
    session_store::{SessionStore, StoreError},
};
pub use use_cases::convene_council::{ConveneCouncilUseCase, ConveneError};
