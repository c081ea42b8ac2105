//! End-to-end command flows through `GateNode`, backed by the nullables.

use std::sync::Arc;
use std::time::Duration;

use unqgate_groups::MembershipProvider;
use unqgate_ledger::LedgerClient;
use unqgate_node::{spawn_sweeper, CommandRequest, GateNode, NodeConfig, ShutdownController};
use unqgate_nullables::{NullClock, NullLedger, NullMembership, NullStore};
use unqgate_roles::{CollectionRule, RoleRules};
use unqgate_store::{
    AttemptStore, HoldingStore, HoldingsStore, NewAttempt, User, UserStore, VerificationStatus,
};
use unqgate_types::{ChainAddress, GroupId, NftRef, RoleId, SubjectId, Timestamp, TokenAmount};

const START: u64 = 1_700_000_000;
const ADDR: &str = "unqAlice";
/// 0.001 at 18 decimals.
const RAW: u128 = 1_000_000_000_000_000;
const GUILD: &str = "4242";
const ADMIN: &str = "900";
const ALICE: &str = "123456789012345678";

struct Gate {
    node: GateNode,
    store: Arc<NullStore>,
    ledger: Arc<NullLedger>,
    membership: Arc<NullMembership>,
    clock: Arc<NullClock>,
}

fn config() -> NodeConfig {
    let mut config = NodeConfig::default();
    config.discord.guild_id = GUILD.to_string();
    config.discord.admin_user_id = Some(ADMIN.to_string());
    config.verification.ledger_call_timeout_secs = 1;
    config.roles = RoleRules {
        collections: vec![CollectionRule {
            collection_id: 123,
            role_id: RoleId::from("500"),
            name: "Rare NFT Holder".into(),
            description: String::new(),
        }],
        ..Default::default()
    };
    config
}

fn gate() -> Gate {
    gate_with(config())
}

fn gate_with(config: NodeConfig) -> Gate {
    let store = Arc::new(NullStore::new());
    let ledger = Arc::new(NullLedger::new(500));
    let membership = Arc::new(NullMembership::new());
    let clock = Arc::new(NullClock::new(START));
    let node = GateNode::new(
        config,
        store.clone() as Arc<dyn HoldingsStore>,
        ledger.clone() as Arc<dyn LedgerClient>,
        membership.clone() as Arc<dyn MembershipProvider>,
        clock.clone(),
    )
    .unwrap();
    Gate {
        node,
        store,
        ledger,
        membership,
        clock,
    }
}

fn guild() -> GroupId {
    GroupId::from(GUILD)
}

fn verified_user(subject: &str, address: &str) -> User {
    User {
        subject: SubjectId::from(subject),
        address: ChainAddress::from(address),
        status: VerificationStatus::Verified,
        verification_amount: TokenAmount::from_parts(1, 3).unwrap(),
        verification_expires_at: Timestamp::new(START + 3_600),
        created_at: Timestamp::new(START),
        updated_at: Timestamp::new(START),
    }
}

fn cmd(name: &str, subject: &str) -> CommandRequest {
    CommandRequest::new(name, subject)
}

#[tokio::test]
async fn verify_then_check_verifies_and_grants_the_verification_role() {
    let g = gate();
    g.membership.add_member(&guild(), ALICE, &[]);

    let reply = g
        .node
        .dispatch(&cmd("admin-setrole", ADMIN).with_arg("role", "777"))
        .await;
    assert!(reply.ok, "{reply}");

    let reply = g
        .node
        .dispatch(&cmd("verify", ALICE).with_arg("address", ADDR))
        .await;
    assert!(reply.ok, "{reply}");
    assert!(reply.lines.iter().any(|l| l == "Amount to transfer: 0.001000 UNQ"));
    assert!(reply.lines.iter().any(|l| l == "Time limit: 1h 0m"));

    g.ledger.add_transfer(499, ADDR, ADDR, RAW);
    let reply = g.node.dispatch(&cmd("check", ALICE)).await;
    assert!(reply.ok, "{reply}");
    assert_eq!(reply.title, "Verification Successful!");
    assert!(reply.lines.iter().any(|l| l == "Block number: 499"));
    assert!(reply.lines.iter().any(|l| l == "Granted role 777"));
    assert_eq!(
        g.membership.roles_of(&guild(), ALICE),
        vec![RoleId::from("777")]
    );
    assert!(g.store.all_attempts().is_empty());

    let reply = g.node.dispatch(&cmd("status", ALICE)).await;
    assert!(reply.ok);
    assert!(reply.lines.iter().any(|l| l == "Status: Verified"));

    assert_eq!(g.node.metrics.verifications_requested.get(), 1);
    assert_eq!(g.node.metrics.verifications_completed.get(), 1);
    assert_eq!(g.node.metrics.roles_granted.get(), 1);
}

#[tokio::test]
async fn verify_short_circuits_for_verified_subjects() {
    let g = gate();
    g.store.put_user(&verified_user(ALICE, ADDR)).unwrap();

    let reply = g
        .node
        .dispatch(&cmd("verify", ALICE).with_arg("address", ADDR))
        .await;
    assert!(reply.ok);
    assert_eq!(reply.title, "You are already verified!");
    assert!(g.store.all_attempts().is_empty());
}

#[tokio::test]
async fn verify_rejects_bad_input_without_writing() {
    let g = gate();
    g.ledger.set_valid_addresses(&[ADDR]);

    let reply = g.node.dispatch(&cmd("verify", ALICE)).await;
    assert_eq!(reply.title, "Missing argument: address");

    let reply = g
        .node
        .dispatch(&cmd("verify", ALICE).with_arg("address", "unqMallory"))
        .await;
    assert!(!reply.ok);
    assert!(reply.title.starts_with("Invalid Unique Network address"));

    assert!(g.store.all_attempts().is_empty());
}

#[tokio::test]
async fn subject_cannot_choose_the_transfer_amount() {
    let g = gate();
    // Someone else's recent self-transfer of 0.37 UNQ.
    g.ledger
        .add_transfer(498, ADDR, ADDR, 370_000_000_000_000_000);

    let reply = g
        .node
        .dispatch(
            &cmd("verify", "666")
                .with_arg("address", ADDR)
                .with_arg("amount", "0.37"),
        )
        .await;
    assert!(reply.ok, "{reply}");
    assert!(reply.lines.iter().any(|l| l == "Amount to transfer: 0.001000 UNQ"));
    let attempts = g.store.all_attempts();
    assert_eq!(attempts.len(), 1);
    assert_eq!(attempts[0].amount, TokenAmount::from_parts(1, 3).unwrap());

    let reply = g.node.dispatch(&cmd("check", "666")).await;
    assert!(!reply.ok, "{reply}");
    assert!(reply.title.starts_with("Transaction not found"));
    assert!(g
        .store
        .get_user(&SubjectId::from("666"))
        .unwrap()
        .map_or(true, |user| !user.is_verified()));
}

#[tokio::test]
async fn check_without_attempt_or_transfer() {
    let g = gate();
    let reply = g.node.dispatch(&cmd("check", ALICE)).await;
    assert!(!reply.ok);
    assert!(reply.title.starts_with("No active verification found"));

    g.node
        .dispatch(&cmd("verify", ALICE).with_arg("address", ADDR))
        .await;
    g.clock.advance(600);
    let reply = g.node.dispatch(&cmd("check", ALICE)).await;
    assert!(!reply.ok);
    assert!(reply.title.starts_with("Transaction not found"));
    assert_eq!(reply.lines, vec!["Time remaining: 50m 0s".to_string()]);
    assert_eq!(g.store.all_attempts().len(), 1);
    assert_eq!(g.node.metrics.polls_not_found.get(), 1);

    g.clock.advance(3_000);
    let reply = g.node.dispatch(&cmd("check", ALICE)).await;
    assert!(reply.title.starts_with("No active verification found"));
}

#[tokio::test]
async fn check_reports_unavailable_ledger() {
    let g = gate();
    g.node
        .dispatch(&cmd("verify", ALICE).with_arg("address", ADDR))
        .await;
    g.ledger.set_down(true);

    let reply = g.node.dispatch(&cmd("check", ALICE)).await;
    assert!(!reply.ok);
    assert_eq!(reply.title, "Error checking verification. Please try again later.");
    assert_eq!(g.node.metrics.ledger_unavailable.get(), 1);
    assert_eq!(g.store.all_attempts().len(), 1);
}

#[tokio::test]
async fn verification_survives_missing_member_and_role() {
    let g = gate();
    g.node
        .dispatch(&cmd("verify", ALICE).with_arg("address", ADDR))
        .await;
    g.ledger.add_transfer(500, ADDR, ADDR, RAW);

    // No verification role configured.
    let reply = g.node.dispatch(&cmd("check", ALICE)).await;
    assert!(reply.ok);
    assert!(!reply.lines.iter().any(|l| l.starts_with("Granted role")));

    // Role configured, but the subject is not in the guild.
    let bob = "222";
    g.node
        .dispatch(&cmd("admin-setrole", ADMIN).with_arg("role", "777"))
        .await;
    g.node
        .dispatch(&cmd("verify", bob).with_arg("address", "unqBob"))
        .await;
    g.ledger.add_transfer(500, "unqBob", "unqBob", RAW);
    let reply = g.node.dispatch(&cmd("check", bob)).await;
    assert!(reply.ok, "{reply}");
    assert!(g.membership.grants().is_empty());
    assert!(g.store.get_user(&SubjectId::from(bob)).unwrap().unwrap().is_verified());
}

#[tokio::test]
async fn admin_commands_require_the_configured_admin() {
    let g = gate();
    for request in [
        cmd("admin-setrole", ALICE).with_arg("role", "777"),
        cmd("sync-role", ALICE),
    ] {
        let reply = g.node.dispatch(&request).await;
        assert!(!reply.ok);
        assert_eq!(reply.title, "You don't have permission to use this command.");
    }

    let mut no_admin = config();
    no_admin.discord.admin_user_id = None;
    let g = gate_with(no_admin);
    let reply = g
        .node
        .dispatch(&cmd("admin-setrole", ADMIN).with_arg("role", "777"))
        .await;
    assert!(!reply.ok);
}

#[tokio::test]
async fn sync_role_needs_a_configured_role() {
    let g = gate();
    let reply = g.node.dispatch(&cmd("sync-role", ADMIN)).await;
    assert!(!reply.ok);
    assert!(reply.title.starts_with("No verification role configured"));
}

#[tokio::test]
async fn sync_role_grants_to_every_verified_member() {
    let g = gate();
    for (subject, roles) in [("1", &[][..]), ("2", &["777"][..]), ("3", &[][..])] {
        g.store.put_user(&verified_user(subject, ADDR)).unwrap();
        g.membership.add_member(&guild(), subject, roles);
    }
    g.store.put_user(&verified_user("4", ADDR)).unwrap();
    g.node
        .dispatch(&cmd("admin-setrole", ADMIN).with_arg("role", "777"))
        .await;

    let reply = g.node.dispatch(&cmd("sync-role", ADMIN)).await;
    assert!(reply.ok, "{reply}");
    assert_eq!(
        reply.lines,
        vec![
            "Total verified users: 4",
            "Roles assigned: 2",
            "Already had role: 1",
            "Errors: 1",
        ]
    );
    assert_eq!(g.node.metrics.roles_granted.get(), 2);

    let reply = g.node.dispatch(&cmd("sync-role", ADMIN)).await;
    assert!(reply.lines.contains(&"Roles assigned: 0".to_string()));
}

#[tokio::test]
async fn checknfts_grants_mapped_roles_to_verified_subjects() {
    let g = gate();
    g.store.put_user(&verified_user(ALICE, ADDR)).unwrap();
    g.membership.add_member(&guild(), ALICE, &[]);
    let inventory: Vec<_> = (1..=7).map(|t| NftRef::new(123, t)).collect();
    g.ledger.set_inventory(ADDR, inventory);

    let reply = g.node.dispatch(&cmd("checknfts", ALICE)).await;
    assert!(reply.ok, "{reply}");
    assert_eq!(reply.title, "Your NFT Collection");
    assert!(reply.lines.iter().any(|l| l == "NFT #5: collection 123, token 5"));
    assert!(!reply.lines.iter().any(|l| l.starts_with("NFT #6")));
    assert!(reply.lines.iter().any(|l| l == "And 2 more NFTs..."));
    assert!(reply.lines.iter().any(|l| l == "Roles granted: 500"));
    assert_eq!(
        g.store.list_holdings(&SubjectId::from(ALICE)).unwrap().len(),
        7
    );

    // Second look grants nothing new.
    let reply = g.node.dispatch(&cmd("checknfts", ALICE)).await;
    assert!(!reply.lines.iter().any(|l| l.starts_with("Roles granted")));
    assert_eq!(g.membership.grants().len(), 1);
}

#[tokio::test]
async fn checknfts_for_unverified_subjects_only_looks() {
    let g = gate();
    g.membership.add_member(&guild(), ALICE, &[]);
    g.ledger.set_inventory(ADDR, vec![NftRef::new(123, 1)]);

    let reply = g.node.dispatch(&cmd("checknfts", ALICE)).await;
    assert!(!reply.ok);
    assert!(reply.title.starts_with("You need to be verified first"));

    let reply = g
        .node
        .dispatch(&cmd("checknfts", ALICE).with_arg("address", ADDR))
        .await;
    assert!(reply.ok);
    assert!(reply.lines.iter().any(|l| l == "Eligible: Rare NFT Holder"));
    assert!(g.membership.grants().is_empty());
    assert!(g.store.list_holdings(&SubjectId::from(ALICE)).unwrap().is_empty());

    let reply = g
        .node
        .dispatch(&cmd("checknfts", ALICE).with_arg("address", "unqEmpty"))
        .await;
    assert_eq!(reply.title, "No NFTs found for this address.");
}

#[tokio::test]
async fn status_before_and_during_verification() {
    let g = gate();
    let reply = g.node.dispatch(&cmd("status", ALICE)).await;
    assert!(!reply.ok);

    g.node
        .dispatch(&cmd("verify", ALICE).with_arg("address", ADDR))
        .await;
    let reply = g.node.dispatch(&cmd("status", ALICE)).await;
    assert!(reply.ok);
    assert_eq!(reply.lines[0], "Status: Pending");
    assert!(reply.lines.iter().any(|l| l.starts_with("Active attempt: 0.001000 UNQ")));
}

#[tokio::test]
async fn unknown_commands_and_store_failures_become_replies() {
    let g = gate();
    let reply = g.node.dispatch(&cmd("verifyunq", ALICE)).await;
    assert!(!reply.ok);
    assert_eq!(reply.title, "Unknown command");

    g.store.set_failing(true);
    let reply = g.node.dispatch(&cmd("status", ALICE)).await;
    assert!(!reply.ok);
    assert_eq!(reply.title, "An error occurred while processing your command.");
}

#[tokio::test]
async fn sweeper_removes_expired_attempts_until_shutdown() {
    let g = gate();
    for (subject, ttl) in [("1", 60), ("2", 600)] {
        g.store
            .put_attempt(NewAttempt {
                subject: SubjectId::from(subject),
                address: ChainAddress::from(ADDR),
                amount: TokenAmount::from_parts(1, 3).unwrap(),
                created_at: Timestamp::new(START),
                expires_at: Timestamp::new(START + ttl),
            })
            .unwrap();
    }
    g.clock.advance(60);

    let shutdown = ShutdownController::new();
    let handle = spawn_sweeper(
        Arc::clone(g.node.machine()),
        Duration::from_millis(10),
        Arc::clone(&g.node.metrics),
        shutdown.subscribe(),
    );
    tokio::time::sleep(Duration::from_millis(100)).await;

    let remaining = g.store.all_attempts();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].subject, SubjectId::from("2"));
    assert_eq!(g.node.metrics.attempts_swept.get(), 1);

    shutdown.shutdown();
    tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("sweeper stops on shutdown")
        .unwrap();
}

#[tokio::test]
async fn node_start_and_join_follow_shutdown() {
    let mut g = gate();
    let shutdown = ShutdownController::new();
    g.node.start(&shutdown);
    shutdown.shutdown();
    tokio::time::timeout(Duration::from_secs(1), g.node.join())
        .await
        .expect("background tasks stop");
}

#[tokio::test]
async fn full_flow_on_lmdb() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(unqgate_store_lmdb::LmdbStore::open(dir.path(), 16 * 1024 * 1024).unwrap());
    let ledger = Arc::new(NullLedger::new(500));
    let membership = Arc::new(NullMembership::new());
    membership.add_member(&guild(), ALICE, &[]);
    let node = GateNode::new(
        config(),
        store.clone(),
        ledger.clone(),
        membership.clone(),
        Arc::new(NullClock::new(START)),
    )
    .unwrap();

    node.dispatch(&cmd("admin-setrole", ADMIN).with_arg("role", "777"))
        .await;
    node.dispatch(&cmd("verify", ALICE).with_arg("address", ADDR))
        .await;
    ledger.add_transfer(480, ADDR, ADDR, RAW);
    let reply = node.dispatch(&cmd("check", ALICE)).await;
    assert!(reply.ok, "{reply}");

    let user = store.get_user(&SubjectId::from(ALICE)).unwrap().unwrap();
    assert!(user.is_verified());
    assert!(store
        .get_attempt(&SubjectId::from(ALICE), Timestamp::new(START))
        .unwrap()
        .is_none());
    assert_eq!(membership.roles_of(&guild(), ALICE), vec![RoleId::from("777")]);
}
