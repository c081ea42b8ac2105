//! Verification attempt storage trait.

use crate::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use unqgate_types::{ChainAddress, SubjectId, Timestamp, TokenAmount};

/// Store-allocated identifier of a verification attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttemptId(pub u64);

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One outstanding challenge: transfer `amount` to yourself before `expires_at`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationAttempt {
    pub id: AttemptId,
    pub subject: SubjectId,
    pub address: ChainAddress,
    pub amount: TokenAmount,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

impl VerificationAttempt {
    /// Expiry is a read-time classification; nothing flips a stored flag.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at.is_past(now)
    }
}

/// An attempt before the store has assigned it an id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewAttempt {
    pub subject: SubjectId,
    pub address: ChainAddress,
    pub amount: TokenAmount,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
}

impl NewAttempt {
    pub fn with_id(self, id: AttemptId) -> VerificationAttempt {
        VerificationAttempt {
            id,
            subject: self.subject,
            address: self.address,
            amount: self.amount,
            created_at: self.created_at,
            expires_at: self.expires_at,
        }
    }
}

/// Trait for storing verification attempts.
///
/// Several attempts may exist for one subject; older ones are not invalidated
/// explicitly, they simply expire.
pub trait AttemptStore {
    /// Persist a new attempt, allocating a fresh, monotonically increasing id.
    fn put_attempt(&self, attempt: NewAttempt) -> Result<VerificationAttempt, StoreError>;

    /// The newest attempt for `subject` that is still live at `as_of`.
    ///
    /// Expired attempts are never returned, even before the sweep deletes them.
    fn get_attempt(
        &self,
        subject: &SubjectId,
        as_of: Timestamp,
    ) -> Result<Option<VerificationAttempt>, StoreError>;

    /// Delete an attempt. Returns `false` if it was already gone.
    fn delete_attempt(&self, id: AttemptId) -> Result<bool, StoreError>;

    /// Every attempt whose deadline has passed at `as_of`.
    fn list_expired_attempts(&self, as_of: Timestamp)
        -> Result<Vec<VerificationAttempt>, StoreError>;
}
