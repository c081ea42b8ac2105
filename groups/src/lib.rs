//! Group membership: who is in a group and which roles they hold.
//!
//! Roles are granted in an external chat platform. The gate only needs three
//! things from it, captured by [`MembershipProvider`]: resolve a member, check
//! a role, grant a role. [`DiscordGuildClient`] implements it over the Discord
//! REST API.

pub mod client;
pub mod error;
pub mod provider;
pub mod types;

pub use client::{DiscordGuildClient, DEFAULT_API_BASE};
pub use error::GroupError;
pub use provider::MembershipProvider;
pub use types::Member;
