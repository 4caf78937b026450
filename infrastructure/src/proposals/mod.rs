//! Proposal source adapters

pub mod command_source;
pub mod demo;

pub use command_source::CommandProposalSource;
pub use demo::DemoProposalSource;
