//! Session persistence adapters

pub mod jsonl;
pub mod memory;

pub use jsonl::JsonlSessionStore;
pub use memory::InMemorySessionStore;
