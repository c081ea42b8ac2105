use unqgate_ledger::TransferMatch;
use unqgate_store::{NftHolding, User, VerificationAttempt};

/// Result of one poll. Only storage failures are errors; everything a
/// subject can cause is an outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollOutcome {
    Verified {
        user: User,
        transfer: TransferMatch,
    },
    /// The transfer has not shown up yet; the attempt stays live.
    NotFound { attempt: VerificationAttempt },
    NoActiveAttempt,
    LedgerUnavailable { reason: String },
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub deleted: usize,
    pub failed: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusReport {
    pub user: Option<User>,
    /// Recorded holdings; only kept for verified users.
    pub holdings: Vec<NftHolding>,
    pub active_attempt: Option<VerificationAttempt>,
}
