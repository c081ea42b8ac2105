use std::time::Duration;

use unqgate_types::TokenAmount;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationConfig {
    /// Amount asked for when the request does not name one.
    pub amount: TokenAmount,
    /// Largest amount a request may ask for.
    pub max_amount: TokenAmount,
    /// Lifetime of an attempt.
    pub timeout_secs: u64,
    /// Number of recent blocks scanned per poll.
    pub scan_window: u64,
    /// Bound on each individual ledger call.
    pub ledger_call_timeout: Duration,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            amount: TokenAmount::from_parts(1, 3).unwrap_or(TokenAmount::ZERO),
            max_amount: TokenAmount::from_parts(1, 0).unwrap_or(TokenAmount::ZERO),
            timeout_secs: 60 * 60,
            scan_window: 50,
            ledger_call_timeout: Duration::from_secs(15),
        }
    }
}
