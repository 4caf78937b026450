//! Port definitions (interfaces to the infrastructure layer)

pub mod consultation;
pub mod expertise_lookup;
pub mod proposal_source;
pub mod session_store;

pub use consultation::{ConsultationError, ConsultationReply, ExternalConsultation};
pub use expertise_lookup::{DEFAULT_EXPERTISE_WEIGHT, ExpertiseLookup};
pub use proposal_source::{ProposalRequest, ProposalSource, SourceError};
pub use session_store::{SessionStore, StoreError};
