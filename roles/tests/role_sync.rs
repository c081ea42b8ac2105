use std::collections::BTreeSet;
use std::sync::Arc;

use unqgate_nullables::{NullMembership, NullStore};
use unqgate_roles::{RoleError, RoleSync, SyncReport};
use unqgate_store::{StoreError, User, UserStore, VerificationStatus};
use unqgate_types::{ChainAddress, GroupId, RoleId, SubjectId, Timestamp, TokenAmount};

fn verified(store: &NullStore, subject: &str) {
    let user = User {
        subject: SubjectId::from(subject),
        address: ChainAddress::from("unqAddr"),
        status: VerificationStatus::Pending,
        verification_amount: TokenAmount::from_parts(1, 3).unwrap(),
        verification_expires_at: Timestamp::new(3_600),
        created_at: Timestamp::new(0),
        updated_at: Timestamp::new(0),
    };
    store.put_user(&user).unwrap();
    store
        .update_user_status(&user.subject, VerificationStatus::Verified, Timestamp::new(10))
        .unwrap();
}

fn guild() -> GroupId {
    GroupId::from("guild")
}

#[tokio::test]
async fn sync_counts_each_outcome() {
    let store = Arc::new(NullStore::new());
    let membership = Arc::new(NullMembership::new());
    verified(&store, "absent");
    verified(&store, "holder");
    verified(&store, "newcomer");
    membership.add_member(&guild(), "holder", &["verified"]);
    membership.add_member(&guild(), "newcomer", &[]);

    let sync = RoleSync::new(store.clone(), membership.clone());
    let report = sync.sync(&guild(), &RoleId::from("verified")).await.unwrap();

    assert_eq!(
        report,
        SyncReport {
            total: 3,
            assigned: 1,
            already_had: 1,
            errors: 1
        }
    );
    assert_eq!(membership.grants().len(), 1);
}

#[tokio::test]
async fn second_sync_is_a_no_op() {
    let store = Arc::new(NullStore::new());
    let membership = Arc::new(NullMembership::new());
    verified(&store, "a");
    membership.add_member(&guild(), "a", &[]);

    let sync = RoleSync::new(store, membership.clone());
    let role = RoleId::from("verified");
    assert_eq!(sync.sync(&guild(), &role).await.unwrap().assigned, 1);
    let again = sync.sync(&guild(), &role).await.unwrap();
    assert_eq!(again.assigned, 0);
    assert_eq!(again.already_had, 1);
    assert_eq!(membership.grants().len(), 1);
}

#[tokio::test]
async fn member_failures_are_counted_not_fatal() {
    let store = Arc::new(NullStore::new());
    let membership = Arc::new(NullMembership::new());
    verified(&store, "flaky");
    verified(&store, "locked");
    verified(&store, "fine");
    membership.add_member(&guild(), "flaky", &[]);
    membership.add_member(&guild(), "locked", &[]);
    membership.add_member(&guild(), "fine", &[]);
    membership.fail_resolve("flaky");
    membership.fail_grant("locked");

    let report = RoleSync::new(store, membership)
        .sync(&guild(), &RoleId::from("verified"))
        .await
        .unwrap();
    assert_eq!(report.total, 3);
    assert_eq!(report.assigned, 1);
    assert_eq!(report.errors, 2);
}

#[tokio::test]
async fn listing_failure_is_surfaced() {
    let store = Arc::new(NullStore::new());
    store.set_failing(true);
    let err = RoleSync::new(store, Arc::new(NullMembership::new()))
        .sync(&guild(), &RoleId::from("verified"))
        .await
        .unwrap_err();
    assert!(matches!(err, RoleError::Store(StoreError::Backend(_))));
}

#[tokio::test]
async fn grant_missing_skips_held_roles() {
    let store = Arc::new(NullStore::new());
    let membership = Arc::new(NullMembership::new());
    membership.add_member(&guild(), "m", &["a"]);
    let roles: BTreeSet<RoleId> = ["a", "b", "c"].into_iter().map(RoleId::from).collect();

    let sync = RoleSync::new(store, membership.clone());
    let report = sync
        .grant_missing(&guild(), &SubjectId::from("m"), &roles)
        .await
        .unwrap();
    assert_eq!(report.already_had, vec![RoleId::from("a")]);
    assert_eq!(report.granted, vec![RoleId::from("b"), RoleId::from("c")]);
    assert!(report.failed.is_empty());
    assert_eq!(membership.roles_of(&guild(), "m").len(), 3);

    let err = sync
        .grant_missing(&guild(), &SubjectId::from("stranger"), &roles)
        .await
        .unwrap_err();
    assert!(matches!(err, RoleError::NotAMember { .. }));
}
