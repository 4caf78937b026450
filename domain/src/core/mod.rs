//! Core domain concepts shared across all subdomains.
//!
//! - [`ids`] — UUID-backed identifier newtypes for sessions, proposals,
//!   critiques, and votes
//! - [`error::DomainError`] — domain-level input errors

pub mod error;
pub mod ids;
