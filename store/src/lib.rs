//! Abstract storage traits for the verification gate.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The rest of the codebase depends only on the traits, and most of it
//! only on the combined [`HoldingsStore`] capability.

pub mod attempt;
pub mod error;
pub mod holding;
pub mod settings;
pub mod user;

pub use attempt::{AttemptId, AttemptStore, NewAttempt, VerificationAttempt};
pub use error::StoreError;
pub use holding::{HoldingStore, NftHolding};
pub use settings::{GateSettings, SettingsStore};
pub use user::{apply_status, User, UserStore, VerificationStatus};

/// Everything the verification gate persists, behind one capability.
///
/// Blanket-implemented for any type that implements every per-entity store.
pub trait HoldingsStore:
    AttemptStore + UserStore + HoldingStore + SettingsStore + Send + Sync
{
}

impl<T> HoldingsStore for T where
    T: AttemptStore + UserStore + HoldingStore + SettingsStore + Send + Sync
{
}
