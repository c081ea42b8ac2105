use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("ledger client is disconnected")]
    Disconnected,

    #[error("ledger endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("ledger call timed out after {0}s")]
    Timeout(u64),

    #[error("block {0} not found")]
    BlockNotFound(u64),

    #[error("invalid response from ledger: {0}")]
    InvalidResponse(String),

    #[error("ledger request failed: {0}")]
    RequestFailed(String),
}

impl LedgerError {
    /// Whether this failure means the connection itself is gone, as opposed to
    /// one block or operation being unreadable.
    pub fn is_connection_loss(&self) -> bool {
        matches!(
            self,
            LedgerError::Disconnected | LedgerError::Unreachable(_) | LedgerError::Timeout(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(LedgerError::Disconnected.is_connection_loss());
        assert!(LedgerError::Timeout(15).is_connection_loss());
        assert!(LedgerError::Unreachable("refused".into()).is_connection_loss());
        assert!(!LedgerError::BlockNotFound(7).is_connection_loss());
        assert!(!LedgerError::InvalidResponse("bad json".into()).is_connection_loss());
    }
}
