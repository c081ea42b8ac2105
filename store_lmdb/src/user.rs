//! LMDB implementation of UserStore.

use unqgate_store::{apply_status, StoreError, User, UserStore, VerificationStatus};
use unqgate_types::{SubjectId, Timestamp};

use crate::environment::{decode, encode};
use crate::{LmdbError, LmdbStore};

impl LmdbStore {
    fn all_users(&self) -> Result<Vec<User>, LmdbError> {
        let rtxn = self.env.read_txn()?;
        let mut users = Vec::new();
        for entry in self.users_db.iter(&rtxn)? {
            let (_, bytes) = entry?;
            users.push(decode(bytes)?);
        }
        Ok(users)
    }
}

impl UserStore for LmdbStore {
    fn get_user(&self, subject: &SubjectId) -> Result<Option<User>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        match self
            .users_db
            .get(&rtxn, subject.as_str().as_bytes())
            .map_err(LmdbError::from)?
        {
            Some(bytes) => Ok(Some(decode(bytes)?)),
            None => Ok(None),
        }
    }

    fn put_user(&self, user: &User) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let key = user.subject.as_str().as_bytes();
        if self
            .users_db
            .get(&wtxn, key)
            .map_err(LmdbError::from)?
            .is_some()
        {
            return Err(StoreError::Duplicate(user.subject.to_string()));
        }
        self.users_db
            .put(&mut wtxn, key, &encode(user)?)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn replace_user(&self, user: &User) -> Result<(), StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let key = user.subject.as_str().as_bytes();
        if self
            .users_db
            .get(&wtxn, key)
            .map_err(LmdbError::from)?
            .is_none()
        {
            return Err(StoreError::NotFound(user.subject.to_string()));
        }
        self.users_db
            .put(&mut wtxn, key, &encode(user)?)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn update_user_status(
        &self,
        subject: &SubjectId,
        status: VerificationStatus,
        now: Timestamp,
    ) -> Result<User, StoreError> {
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let key = subject.as_str().as_bytes();
        let mut user: User = match self.users_db.get(&wtxn, key).map_err(LmdbError::from)? {
            Some(bytes) => decode(bytes)?,
            None => return Err(StoreError::NotFound(subject.to_string())),
        };
        if user.status == status {
            return Ok(user);
        }
        apply_status(&mut user, status, now);
        self.users_db
            .put(&mut wtxn, key, &encode(&user)?)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(user)
    }

    fn list_verified_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self
            .all_users()?
            .into_iter()
            .filter(User::is_verified)
            .collect())
    }
}
