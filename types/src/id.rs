//! Identifier types.
//!
//! Subjects, groups and roles are identified by opaque strings issued by the
//! chat platform; accounts by their chain-native address string. Format checks
//! that need chain knowledge (SS58 checksums) live in the ledger client, not here.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
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

string_id!(
    /// External identity of the person being verified (a chat-platform user id).
    SubjectId
);

string_id!(
    /// A chain-native account identifier, e.g. an SS58 address.
    ChainAddress
);

string_id!(
    /// A group (guild) in which roles are granted.
    GroupId
);

string_id!(
    /// An externally managed group-membership grant.
    RoleId
);

/// A reference to one non-fungible token: collection id plus token id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NftRef {
    pub collection_id: u32,
    pub token_id: u32,
}

impl NftRef {
    pub fn new(collection_id: u32, token_id: u32) -> Self {
        Self {
            collection_id,
            token_id,
        }
    }
}

impl fmt::Display for NftRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.collection_id, self.token_id)
    }
}
