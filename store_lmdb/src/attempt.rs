//! LMDB implementation of AttemptStore.
//!
//! Attempts live in `attempts` keyed by id; `attempts_by_subject` is a
//! composite-key index `len ++ subject ++ id`, so a subject's attempts are a
//! prefix range-scan returned in id (creation) order.

use unqgate_store::{AttemptId, AttemptStore, NewAttempt, StoreError, VerificationAttempt};
use unqgate_types::{SubjectId, Timestamp};

use crate::environment::{decode, encode, scan_prefix};
use crate::keys::{string_prefix, string_u64_key, trailing_u64};
use crate::{LmdbError, LmdbStore};

const NEXT_ATTEMPT_ID_KEY: &[u8] = b"next_attempt_id";

impl AttemptStore for LmdbStore {
    fn put_attempt(&self, attempt: NewAttempt) -> Result<VerificationAttempt, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        let next = match self
            .meta_db
            .get(&wtxn, NEXT_ATTEMPT_ID_KEY)
            .map_err(LmdbError::from)?
        {
            Some(bytes) => trailing_u64(bytes)
                .ok_or_else(|| LmdbError::Serialization("corrupt attempt counter".into()))?,
            None => 1,
        };
        let attempt = attempt.with_id(AttemptId(next));

        self.attempts_db
            .put(&mut wtxn, &next.to_be_bytes(), &encode(&attempt)?)
            .map_err(LmdbError::from)?;
        self.attempts_by_subject_db
            .put(
                &mut wtxn,
                &string_u64_key(attempt.subject.as_str(), next),
                &[],
            )
            .map_err(LmdbError::from)?;
        self.meta_db
            .put(&mut wtxn, NEXT_ATTEMPT_ID_KEY, &(next + 1).to_be_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(attempt)
    }

    fn get_attempt(
        &self,
        subject: &SubjectId,
        as_of: Timestamp,
    ) -> Result<Option<VerificationAttempt>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let index = scan_prefix(
            &self.attempts_by_subject_db,
            &rtxn,
            &string_prefix(subject.as_str()),
        )?;

        // Newest first: the index is in ascending id order.
        for (key, _) in index.iter().rev() {
            let Some(id) = trailing_u64(key) else {
                continue;
            };
            let Some(bytes) = self
                .attempts_db
                .get(&rtxn, &id.to_be_bytes())
                .map_err(LmdbError::from)?
            else {
                continue;
            };
            let attempt: VerificationAttempt = decode(bytes)?;
            if !attempt.is_expired(as_of) {
                return Ok(Some(attempt));
            }
        }
        Ok(None)
    }

    fn delete_attempt(&self, id: AttemptId) -> Result<bool, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let key = id.0.to_be_bytes();
        let existing = match self.attempts_db.get(&wtxn, &key).map_err(LmdbError::from)? {
            Some(bytes) => Some(decode::<VerificationAttempt>(bytes)?),
            None => None,
        };
        let Some(attempt) = existing else {
            return Ok(false);
        };
        self.attempts_db
            .delete(&mut wtxn, &key)
            .map_err(LmdbError::from)?;
        self.attempts_by_subject_db
            .delete(&mut wtxn, &string_u64_key(attempt.subject.as_str(), id.0))
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(true)
    }

    fn list_expired_attempts(
        &self,
        as_of: Timestamp,
    ) -> Result<Vec<VerificationAttempt>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut expired = Vec::new();
        for entry in self.attempts_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_, bytes) = entry.map_err(LmdbError::from)?;
            let attempt: VerificationAttempt = decode(bytes)?;
            if attempt.is_expired(as_of) {
                expired.push(attempt);
            }
        }
        Ok(expired)
    }
}
