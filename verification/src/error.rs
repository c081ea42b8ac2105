use thiserror::Error;
use unqgate_ledger::LedgerError;
use unqgate_store::StoreError;

#[derive(Debug, Error)]
pub enum VerificationError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("amount out of range: {0}")]
    AmountOutOfRange(String),

    #[error("subject {0} is not verified")]
    NotVerified(String),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}
