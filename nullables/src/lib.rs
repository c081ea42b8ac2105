//! Nullable infrastructure for deterministic testing.
//!
//! Every collaborator of the gate (clock, storage, ledger, group membership)
//! sits behind a trait. This crate provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be scripted and made to fail on demand
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod clock;
pub mod ledger;
pub mod membership;
pub mod store;

pub use clock::NullClock;
pub use ledger::NullLedger;
pub use membership::NullMembership;
pub use store::NullStore;
