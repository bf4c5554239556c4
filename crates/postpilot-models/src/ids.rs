//! Typed identifiers for PostPilot entities.
//!
//! Newtype wrappers around UUID strings so that a session id can never be
//! passed where a post id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Generate a new random id.
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            /// Wrap an existing id value.
            pub fn from_string(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The id as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
    };
}

define_id! {
    /// Identifier for a user session.
    SessionId
}

define_id! {
    /// Identifier for a finalized post record.
    PostId
}

define_id! {
    /// Identifier linking posts that belong to the same series.
    SeriesId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(PostId::new(), PostId::new());
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn test_id_roundtrip() {
        let id = SeriesId::from_string("series-42");
        assert_eq!(id.as_str(), "series-42");
        assert_eq!(id.to_string(), "series-42");

        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"series-42\"");
        let parsed: SeriesId = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
    }
}
