use tempfile::TempDir;

use unqgate_store::{
    AttemptStore, GateSettings, HoldingStore, NewAttempt, SettingsStore, StoreError, User,
    UserStore, VerificationStatus,
};
use unqgate_store_lmdb::LmdbStore;
use unqgate_types::{ChainAddress, NftRef, RoleId, SubjectId, Timestamp, TokenAmount};

fn open() -> (TempDir, LmdbStore) {
    let dir = TempDir::new().unwrap();
    let store = LmdbStore::open(dir.path(), 16 * 1024 * 1024).unwrap();
    (dir, store)
}

fn attempt(subject: &str, created: u64, ttl: u64) -> NewAttempt {
    NewAttempt {
        subject: SubjectId::from(subject),
        address: ChainAddress::from("unqAddress"),
        amount: "0.001".parse().unwrap(),
        created_at: Timestamp::new(created),
        expires_at: Timestamp::new(created + ttl),
    }
}

fn pending_user(subject: &str, at: u64) -> User {
    User {
        subject: SubjectId::from(subject),
        address: ChainAddress::from("unqAddress"),
        status: VerificationStatus::Pending,
        verification_amount: TokenAmount::from_parts(1, 3).unwrap(),
        verification_expires_at: Timestamp::new(at + 3600),
        created_at: Timestamp::new(at),
        updated_at: Timestamp::new(at),
    }
}

#[test]
fn attempt_ids_increase_and_newest_live_attempt_wins() {
    let (_dir, store) = open();
    let a = store.put_attempt(attempt("alice", 100, 3600)).unwrap();
    let b = store.put_attempt(attempt("alice", 200, 3600)).unwrap();
    assert!(b.id > a.id);

    let found = store
        .get_attempt(&SubjectId::from("alice"), Timestamp::new(300))
        .unwrap()
        .unwrap();
    assert_eq!(found.id, b.id);
}

#[test]
fn expired_attempt_is_invisible_but_listed_for_sweep() {
    let (_dir, store) = open();
    let a = store.put_attempt(attempt("bob", 100, 60)).unwrap();
    let bob = SubjectId::from("bob");

    assert!(store.get_attempt(&bob, Timestamp::new(159)).unwrap().is_some());
    assert!(store.get_attempt(&bob, Timestamp::new(160)).unwrap().is_none());

    let expired = store.list_expired_attempts(Timestamp::new(160)).unwrap();
    assert_eq!(expired, vec![a.clone()]);
    assert!(store.list_expired_attempts(Timestamp::new(159)).unwrap().is_empty());

    assert!(store.delete_attempt(a.id).unwrap());
    assert!(!store.delete_attempt(a.id).unwrap());
    assert!(store.list_expired_attempts(Timestamp::new(1000)).unwrap().is_empty());
}

#[test]
fn attempts_for_other_subjects_are_not_returned() {
    let (_dir, store) = open();
    store.put_attempt(attempt("carol", 100, 3600)).unwrap();
    assert!(store
        .get_attempt(&SubjectId::from("carl"), Timestamp::new(100))
        .unwrap()
        .is_none());
}

#[test]
fn user_lifecycle() {
    let (_dir, store) = open();
    let user = pending_user("dave", 100);
    store.put_user(&user).unwrap();
    assert!(matches!(store.put_user(&user), Err(StoreError::Duplicate(_))));

    assert!(store.list_verified_users().unwrap().is_empty());

    let updated = store
        .update_user_status(&user.subject, VerificationStatus::Verified, Timestamp::new(500))
        .unwrap();
    assert!(updated.is_verified());
    assert_eq!(updated.updated_at, Timestamp::new(500));

    let again = store
        .update_user_status(&user.subject, VerificationStatus::Verified, Timestamp::new(900))
        .unwrap();
    assert_eq!(again.updated_at, Timestamp::new(500));

    assert_eq!(store.get_user(&user.subject).unwrap(), Some(updated));
    assert_eq!(store.list_verified_users().unwrap().len(), 1);
}

#[test]
fn replace_user_overwrites_only_existing_records() {
    let (_dir, store) = open();
    let mut user = pending_user("fern", 100);
    assert!(matches!(store.replace_user(&user), Err(StoreError::NotFound(_))));
    assert!(store.get_user(&user.subject).unwrap().is_none());

    store.put_user(&user).unwrap();
    user.address = ChainAddress::from("unqFernNew");
    user.updated_at = Timestamp::new(300);
    store.replace_user(&user).unwrap();
    assert_eq!(store.get_user(&user.subject).unwrap(), Some(user));
}

#[test]
fn updating_missing_user_is_not_found() {
    let (_dir, store) = open();
    let err = store
        .update_user_status(
            &SubjectId::from("ghost"),
            VerificationStatus::Verified,
            Timestamp::new(1),
        )
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[test]
fn holdings_upsert_and_list_in_order() {
    let (_dir, store) = open();
    let owner = SubjectId::from("erin");
    store.add_holding(&owner, NftRef::new(2, 1), Timestamp::new(10)).unwrap();
    store.add_holding(&owner, NftRef::new(1, 9), Timestamp::new(10)).unwrap();
    store.add_holding(&owner, NftRef::new(2, 1), Timestamp::new(50)).unwrap();
    store
        .add_holding(&SubjectId::from("erina"), NftRef::new(1, 1), Timestamp::new(10))
        .unwrap();

    let held = store.list_holdings(&owner).unwrap();
    assert_eq!(held.len(), 2);
    assert_eq!(held[0].nft, NftRef::new(1, 9));
    assert_eq!(held[1].nft, NftRef::new(2, 1));
    assert_eq!(held[1].verified_at, Timestamp::new(50));
}

#[test]
fn settings_default_then_persist_across_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = LmdbStore::open(dir.path(), 16 * 1024 * 1024).unwrap();
        assert_eq!(store.load_settings().unwrap(), GateSettings::default());
        store
            .save_settings(&GateSettings {
                verification_role: Some(RoleId::from("42")),
            })
            .unwrap();
    }
    let store = LmdbStore::open(dir.path(), 16 * 1024 * 1024).unwrap();
    assert_eq!(
        store.load_settings().unwrap().verification_role,
        Some(RoleId::from("42"))
    );
}
