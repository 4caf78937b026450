//! Entity identifier newtypes
//!
//! Each identifier wraps a v4 UUID. `Ord` is derived so that id-keyed maps
//! (notably the aggregator's score map) enumerate deterministically.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Generate a fresh random identifier
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// The underlying UUID
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

define_id!(
    /// Identifier of a council deliberation session
    SessionId
);
define_id!(
    /// Identifier of a proposal
    ProposalId
);
define_id!(
    /// Identifier of a critique exchanged during debate
    CritiqueId
);
define_id!(
    /// Identifier of a single vote
    VoteId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(ProposalId::new(), ProposalId::new());
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn test_display_roundtrip() {
        let id = ProposalId::new();
        let parsed: ProposalId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_serde_transparent() {
        let id = VoteId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }

    #[test]
    fn test_ordering_matches_uuid_ordering() {
        let a = ProposalId::from_uuid(Uuid::from_u128(1));
        let b = ProposalId::from_uuid(Uuid::from_u128(2));
        assert!(a < b);
    }
}
