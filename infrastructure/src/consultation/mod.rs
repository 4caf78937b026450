//! External consultation adapters

pub mod command;

pub use command::CommandConsultation;
