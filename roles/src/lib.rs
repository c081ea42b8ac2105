//! Roles derived from verification and NFT holdings.
//!
//! [`RoleMapper`] turns an NFT inventory into a role set using the configured
//! [`RoleRules`]. [`RoleSync`] brings group membership in line with the
//! verified-user set, one member at a time, tolerating per-member failures.

pub mod error;
pub mod mapper;
pub mod rules;
pub mod sync;

pub use error::RoleError;
pub use mapper::{RoleGrant, RoleMapper};
pub use rules::{CollectionRule, QuantityTier, RoleRules, SpecialTokenRule};
pub use sync::{GrantReport, RoleSync, SyncReport};
