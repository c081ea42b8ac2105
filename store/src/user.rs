//! User storage trait.

use crate::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use unqgate_types::{ChainAddress, SubjectId, Timestamp, TokenAmount};

/// Durable outcome of verification for one subject.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationStatus {
    Pending,
    Verified,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
        }
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique key.
    pub subject: SubjectId,
    pub address: ChainAddress,
    pub status: VerificationStatus,
    pub verification_amount: TokenAmount,
    pub verification_expires_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    pub fn is_verified(&self) -> bool {
        self.status == VerificationStatus::Verified
    }
}

/// Trait for user storage operations.
pub trait UserStore {
    fn get_user(&self, subject: &SubjectId) -> Result<Option<User>, StoreError>;

    /// Insert a new user. Fails with [`StoreError::Duplicate`] if the subject exists.
    fn put_user(&self, user: &User) -> Result<(), StoreError>;

    /// Overwrite an existing user record. Fails with [`StoreError::NotFound`]
    /// if the subject has no record.
    fn replace_user(&self, user: &User) -> Result<(), StoreError>;

    /// Set a user's status and return the updated record.
    ///
    /// `updated_at` only moves when the status actually changes, so repeating
    /// an update is a no-op. Fails with [`StoreError::NotFound`] for unknown subjects.
    fn update_user_status(
        &self,
        subject: &SubjectId,
        status: VerificationStatus,
        now: Timestamp,
    ) -> Result<User, StoreError>;

    fn list_verified_users(&self) -> Result<Vec<User>, StoreError>;
}

/// Shared `update_user_status` semantics for backends.
pub fn apply_status(user: &mut User, status: VerificationStatus, now: Timestamp) {
    if user.status != status {
        user.status = status;
        user.updated_at = now;
    }
}
