//! Nullable store: thread-safe in-memory holdings store for testing.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use unqgate_store::{
    apply_status, AttemptId, AttemptStore, GateSettings, HoldingStore, NewAttempt, NftHolding,
    SettingsStore, StoreError, User, UserStore, VerificationAttempt, VerificationStatus,
};
use unqgate_types::{NftRef, SubjectId, Timestamp};

/// An in-memory implementation of every store trait.
/// Thread-safe for use with tokio's multi-threaded runtime.
pub struct NullStore {
    attempts: Mutex<BTreeMap<u64, VerificationAttempt>>,
    next_attempt_id: Mutex<u64>,
    users: Mutex<HashMap<SubjectId, User>>,
    holdings: Mutex<BTreeMap<(SubjectId, NftRef), NftHolding>>,
    settings: Mutex<GateSettings>,
    failing: AtomicBool,
}

impl NullStore {
    pub fn new() -> Self {
        Self {
            attempts: Mutex::new(BTreeMap::new()),
            next_attempt_id: Mutex::new(1),
            users: Mutex::new(HashMap::new()),
            holdings: Mutex::new(BTreeMap::new()),
            settings: Mutex::new(GateSettings::default()),
            failing: AtomicBool::new(false),
        }
    }

    /// While set, every operation fails with a backend error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Every stored attempt, expired or not.
    pub fn all_attempts(&self) -> Vec<VerificationAttempt> {
        self.attempts.lock().unwrap().values().cloned().collect()
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Backend("injected failure".into()))
        } else {
            Ok(())
        }
    }
}

impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AttemptStore for NullStore {
    fn put_attempt(&self, attempt: NewAttempt) -> Result<VerificationAttempt, StoreError> {
        self.check()?;
        let mut next = self.next_attempt_id.lock().unwrap();
        let attempt = attempt.with_id(AttemptId(*next));
        *next += 1;
        self.attempts
            .lock()
            .unwrap()
            .insert(attempt.id.0, attempt.clone());
        Ok(attempt)
    }

    fn get_attempt(
        &self,
        subject: &SubjectId,
        as_of: Timestamp,
    ) -> Result<Option<VerificationAttempt>, StoreError> {
        self.check()?;
        Ok(self
            .attempts
            .lock()
            .unwrap()
            .values()
            .rev()
            .find(|a| &a.subject == subject && !a.is_expired(as_of))
            .cloned())
    }

    fn delete_attempt(&self, id: AttemptId) -> Result<bool, StoreError> {
        self.check()?;
        Ok(self.attempts.lock().unwrap().remove(&id.0).is_some())
    }

    fn list_expired_attempts(
        &self,
        as_of: Timestamp,
    ) -> Result<Vec<VerificationAttempt>, StoreError> {
        self.check()?;
        Ok(self
            .attempts
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.is_expired(as_of))
            .cloned()
            .collect())
    }
}

impl UserStore for NullStore {
    fn get_user(&self, subject: &SubjectId) -> Result<Option<User>, StoreError> {
        self.check()?;
        Ok(self.users.lock().unwrap().get(subject).cloned())
    }

    fn put_user(&self, user: &User) -> Result<(), StoreError> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&user.subject) {
            return Err(StoreError::Duplicate(user.subject.to_string()));
        }
        users.insert(user.subject.clone(), user.clone());
        Ok(())
    }

    fn replace_user(&self, user: &User) -> Result<(), StoreError> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        let slot = users
            .get_mut(&user.subject)
            .ok_or_else(|| StoreError::NotFound(user.subject.to_string()))?;
        *slot = user.clone();
        Ok(())
    }

    fn update_user_status(
        &self,
        subject: &SubjectId,
        status: VerificationStatus,
        now: Timestamp,
    ) -> Result<User, StoreError> {
        self.check()?;
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(subject)
            .ok_or_else(|| StoreError::NotFound(subject.to_string()))?;
        apply_status(user, status, now);
        Ok(user.clone())
    }

    fn list_verified_users(&self) -> Result<Vec<User>, StoreError> {
        self.check()?;
        let mut users: Vec<User> = self
            .users
            .lock()
            .unwrap()
            .values()
            .filter(|u| u.is_verified())
            .cloned()
            .collect();
        users.sort_by(|a, b| a.subject.cmp(&b.subject));
        Ok(users)
    }
}

impl HoldingStore for NullStore {
    fn add_holding(
        &self,
        owner: &SubjectId,
        nft: NftRef,
        at: Timestamp,
    ) -> Result<NftHolding, StoreError> {
        self.check()?;
        let holding = NftHolding {
            owner: owner.clone(),
            nft,
            verified_at: at,
        };
        self.holdings
            .lock()
            .unwrap()
            .insert((owner.clone(), nft), holding.clone());
        Ok(holding)
    }

    fn list_holdings(&self, owner: &SubjectId) -> Result<Vec<NftHolding>, StoreError> {
        self.check()?;
        Ok(self
            .holdings
            .lock()
            .unwrap()
            .values()
            .filter(|h| &h.owner == owner)
            .cloned()
            .collect())
    }
}

impl SettingsStore for NullStore {
    fn load_settings(&self) -> Result<GateSettings, StoreError> {
        self.check()?;
        Ok(self.settings.lock().unwrap().clone())
    }

    fn save_settings(&self, settings: &GateSettings) -> Result<(), StoreError> {
        self.check()?;
        *self.settings.lock().unwrap() = settings.clone();
        Ok(())
    }
}
