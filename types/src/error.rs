//! Errors raised while constructing or converting fundamental types.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid decimal amount: {0}")]
    InvalidAmount(String),

    #[error("amount has {scale} fractional digits but the chain only supports {decimals}")]
    PrecisionExceeded { scale: u8, decimals: u8 },

    #[error("amount overflows the chain's raw unit")]
    Overflow,
}
