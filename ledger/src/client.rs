use async_trait::async_trait;
use unqgate_types::NftRef;

use crate::{Block, LedgerError};

/// Read access to the chain.
///
/// Implementations report connection state explicitly so the detector can
/// tell a dead connection apart from one unreadable block.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    async fn current_height(&self) -> Result<u64, LedgerError>;

    /// `Ok(None)` when the block exists but has no retrievable operations.
    async fn block_at(&self, height: u64) -> Result<Option<Block>, LedgerError>;

    fn validate_address_format(&self, address: &str) -> bool;

    /// Decimal precision of the native token.
    async fn native_decimals(&self) -> Result<u8, LedgerError>;

    fn is_connected(&self) -> bool;

    async fn reconnect(&self) -> Result<(), LedgerError>;

    /// NFTs currently owned by `address`.
    async fn tokens_owned_by(&self, address: &str) -> Result<Vec<NftRef>, LedgerError>;
}
