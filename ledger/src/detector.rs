//! Self-transfer detection over a bounded window of recent blocks.
//!
//! Blocks are scanned head first, operations in block order, and the first
//! exact match ends the scan. A block or operation that cannot be read is
//! logged and skipped. Losing the connection aborts the scan; the whole scan
//! is retried once after a reconnect.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use unqgate_types::{ChainAddress, TokenAmount};

use crate::{Call, LedgerClient, LedgerError};

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferMatch {
    pub block_height: u64,
    /// `"{height}-{index}"`.
    pub operation_ref: String,
    pub tx_hash: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Detection {
    Found(TransferMatch),
    NotFound,
    /// The ledger could not be reached even after one reconnect.
    Unreachable { reason: String },
}

impl Detection {
    pub fn is_found(&self) -> bool {
        matches!(self, Detection::Found(_))
    }
}

pub struct TransferDetector<L: ?Sized> {
    ledger: Arc<L>,
    call_timeout: Duration,
}

impl<L: LedgerClient + ?Sized> TransferDetector<L> {
    pub fn new(ledger: Arc<L>) -> Self {
        Self::with_timeout(ledger, DEFAULT_CALL_TIMEOUT)
    }

    pub fn with_timeout(ledger: Arc<L>, call_timeout: Duration) -> Self {
        Self {
            ledger,
            call_timeout,
        }
    }

    pub fn ledger(&self) -> &Arc<L> {
        &self.ledger
    }

    /// Look for a transfer of exactly `amount` signed by `from` to `to` in the
    /// `window` most recent blocks.
    ///
    /// At most one reconnect per call: a reconnect before the scan uses it up.
    pub async fn detect(
        &self,
        from: &ChainAddress,
        to: &ChainAddress,
        amount: &TokenAmount,
        window: u64,
    ) -> Detection {
        let reconnected = !self.ledger.is_connected();
        if reconnected {
            tracing::info!("ledger disconnected before scan, reconnecting");
            if let Err(e) = self.bounded(self.ledger.reconnect()).await {
                tracing::warn!(error = %e, "ledger reconnect failed");
                return Detection::Unreachable {
                    reason: e.to_string(),
                };
            }
        }

        let first = match self.scan(from, to, amount, window).await {
            Ok(detection) => return detection,
            Err(e) => e,
        };
        if reconnected {
            tracing::warn!(error = %first, "ledger connection lost again after reconnect");
            return Detection::Unreachable {
                reason: first.to_string(),
            };
        }
        tracing::warn!(error = %first, "ledger connection lost during scan, retrying once");

        if let Err(e) = self.bounded(self.ledger.reconnect()).await {
            tracing::warn!(error = %e, "ledger reconnect failed");
            return Detection::Unreachable {
                reason: e.to_string(),
            };
        }
        match self.scan(from, to, amount, window).await {
            Ok(detection) => detection,
            Err(e) => {
                tracing::warn!(error = %e, "ledger unreachable after reconnect");
                Detection::Unreachable {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// One pass over the window. `Err` only for failures that end the pass.
    async fn scan(
        &self,
        from: &ChainAddress,
        to: &ChainAddress,
        amount: &TokenAmount,
        window: u64,
    ) -> Result<Detection, LedgerError> {
        let decimals = self.bounded(self.ledger.native_decimals()).await?;
        let raw = match amount.to_raw(decimals) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(%amount, decimals, error = %e, "amount not representable on chain");
                return Ok(Detection::NotFound);
            }
        };
        if window == 0 {
            return Ok(Detection::NotFound);
        }

        let head = self.bounded(self.ledger.current_height()).await?;
        let lowest = head.saturating_sub(window - 1);
        tracing::debug!(head, lowest, %from, %to, raw, "scanning for transfer");

        for height in (lowest..=head).rev() {
            let block = match self.bounded(self.ledger.block_at(height)).await {
                Ok(Some(block)) => block,
                Ok(None) => {
                    tracing::debug!(height, "skipping block without operations");
                    continue;
                }
                Err(e) if e.is_connection_loss() => return Err(e),
                Err(e) => {
                    tracing::warn!(height, error = %e, "skipping unreadable block");
                    continue;
                }
            };

            for op in &block.operations {
                if let Call::Undecodable(reason) = &op.call {
                    tracing::warn!(height, index = op.index, %reason, "skipping undecodable operation");
                    continue;
                }
                if op.is_transfer(from, to, raw) {
                    let found = TransferMatch {
                        block_height: height,
                        operation_ref: format!("{height}-{}", op.index),
                        tx_hash: op.hash.clone(),
                    };
                    tracing::info!(height, operation = %found.operation_ref, "transfer found");
                    return Ok(Detection::Found(found));
                }
            }
        }

        tracing::debug!(window, "transfer not found in window");
        Ok(Detection::NotFound)
    }

    async fn bounded<T>(
        &self,
        call: impl Future<Output = Result<T, LedgerError>>,
    ) -> Result<T, LedgerError> {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(LedgerError::Timeout(self.call_timeout.as_secs())),
        }
    }
}
