//! LMDB implementation of HoldingStore.

use unqgate_store::{HoldingStore, NftHolding, StoreError};
use unqgate_types::{NftRef, SubjectId, Timestamp};

use crate::environment::{decode, encode, scan_prefix};
use crate::keys::{string_prefix, string_u32_pair_key};
use crate::{LmdbError, LmdbStore};

impl HoldingStore for LmdbStore {
    fn add_holding(
        &self,
        owner: &SubjectId,
        nft: NftRef,
        at: Timestamp,
    ) -> Result<NftHolding, StoreError> {
        let holding = NftHolding {
            owner: owner.clone(),
            nft,
            verified_at: at,
        };
        let key = string_u32_pair_key(owner.as_str(), nft.collection_id, nft.token_id);
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.holdings_db
            .put(&mut wtxn, &key, &encode(&holding)?)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(holding)
    }

    fn list_holdings(&self, owner: &SubjectId) -> Result<Vec<NftHolding>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let entries = scan_prefix(&self.holdings_db, &rtxn, &string_prefix(owner.as_str()))?;
        let mut holdings = Vec::with_capacity(entries.len());
        for (_, bytes) in entries {
            holdings.push(decode(&bytes)?);
        }
        Ok(holdings)
    }
}
