//! Recorded NFT ownership storage trait.

use crate::StoreError;
use serde::{Deserialize, Serialize};
use unqgate_types::{NftRef, SubjectId, Timestamp};

/// One NFT observed to belong to a verified user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftHolding {
    pub owner: SubjectId,
    pub nft: NftRef,
    /// When this holding was last observed.
    pub verified_at: Timestamp,
}

/// Trait for holdings storage.
///
/// Keyed by `(owner, collection, token)`: recording a holding that is already
/// known refreshes its `verified_at` instead of adding a second row.
pub trait HoldingStore {
    fn add_holding(
        &self,
        owner: &SubjectId,
        nft: NftRef,
        at: Timestamp,
    ) -> Result<NftHolding, StoreError>;

    /// Holdings of `owner`, ordered by `(collection, token)`.
    fn list_holdings(&self, owner: &SubjectId) -> Result<Vec<NftHolding>, StoreError>;
}
