//! Command routing.
//!
//! Each command name maps to one handler. A handler runs to completion for
//! one request and returns a [`Reply`]; errors it returns are turned into a
//! generic error reply by [`GateNode::dispatch`].

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use unqgate_types::{RoleId, SubjectId};
use unqgate_utils::{format_amount, format_remaining, sanitize_input, short_address};
use unqgate_verification::{PollOutcome, VerificationError};

use crate::{GateNode, NodeError};

/// NFTs listed individually in a `checknfts` reply.
const NFT_PREVIEW: usize = 5;

const DENIED: &str = "You don't have permission to use this command.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandRequest {
    pub name: String,
    pub subject: SubjectId,
    pub args: HashMap<String, String>,
}

impl CommandRequest {
    pub fn new(name: impl Into<String>, subject: impl Into<SubjectId>) -> Self {
        Self {
            name: name.into(),
            subject: subject.into(),
            args: HashMap::new(),
        }
    }

    /// Add an argument. Values are sanitized on the way in.
    pub fn with_arg(mut self, key: impl Into<String>, value: &str) -> Self {
        self.args.insert(key.into(), sanitize_input(value));
        self
    }

    /// A non-empty argument value.
    pub fn arg(&self, key: &str) -> Option<&str> {
        self.args
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub ok: bool,
    pub title: String,
    pub lines: Vec<String>,
}

impl Reply {
    pub fn success(title: impl Into<String>) -> Self {
        Self {
            ok: true,
            title: title.into(),
            lines: Vec::new(),
        }
    }

    pub fn failure(title: impl Into<String>) -> Self {
        Self {
            ok: false,
            title: title.into(),
            lines: Vec::new(),
        }
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    fn missing_arg(name: &str) -> Self {
        Self::failure(format!("Missing argument: {name}"))
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = if self.ok { "ok" } else { "error" };
        write!(f, "[{mark}] {}", self.title)?;
        for line in &self.lines {
            write!(f, "\n  {line}")?;
        }
        Ok(())
    }
}

pub type HandlerFuture<'a> = Pin<Box<dyn Future<Output = Result<Reply, NodeError>> + Send + 'a>>;

pub type Handler = for<'a> fn(&'a GateNode, &'a CommandRequest) -> HandlerFuture<'a>;

/// Command name to handler.
#[derive(Default)]
pub struct CommandRouter {
    handlers: HashMap<&'static str, Handler>,
}

macro_rules! handler {
    ($f:ident) => {{
        fn boxed<'a>(node: &'a GateNode, request: &'a CommandRequest) -> HandlerFuture<'a> {
            Box::pin($f(node, request))
        }
        boxed as Handler
    }};
}

impl CommandRouter {
    /// Router with every built-in command registered.
    pub fn builtin() -> Self {
        let mut router = Self::default();
        router.register("verify", handler!(verify));
        router.register("check", handler!(check));
        router.register("checknfts", handler!(check_nfts));
        router.register("status", handler!(status));
        router.register("admin-setrole", handler!(admin_set_role));
        router.register("sync-role", handler!(sync_role));
        router
    }

    pub fn register(&mut self, name: &'static str, handler: Handler) {
        self.handlers.insert(name, handler);
    }

    pub fn get(&self, name: &str) -> Option<Handler> {
        self.handlers.get(name).copied()
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

// ── Handlers ───────────────────────────────────────────────────────────

/// Subjects never choose the amount; every attempt uses the configured one.
async fn verify(node: &GateNode, request: &CommandRequest) -> Result<Reply, NodeError> {
    let Some(address) = request.arg("address") else {
        return Ok(Reply::missing_arg("address"));
    };
    if node
        .store
        .get_user(&request.subject)?
        .is_some_and(|user| user.is_verified())
    {
        return Ok(Reply::success("You are already verified!"));
    }

    let attempt = match node
        .machine
        .request_verification(&request.subject, address, None)
        .await
    {
        Ok(attempt) => attempt,
        Err(VerificationError::InvalidAddress(_)) => {
            return Ok(Reply::failure(
                "Invalid Unique Network address format. Please provide a valid address.",
            ))
        }
        Err(VerificationError::Ledger(e)) => {
            tracing::warn!(subject = %request.subject, error = %e, "ledger unavailable for verify");
            node.metrics.ledger_unavailable.inc();
            return Ok(Reply::failure(
                "The ledger is unavailable right now. Please try again later.",
            ));
        }
        Err(e) => return Err(e.into()),
    };
    node.metrics.verifications_requested.inc();

    let amount = format_amount(&attempt.amount);
    Ok(Reply::success("Unique Network Wallet Verification")
        .line(format!(
            "To verify your wallet ownership, transfer {amount} UNQ to yourself."
        ))
        .line(format!("Your address: {}", attempt.address))
        .line(format!("Amount to transfer: {amount} UNQ"))
        .line(format!(
            "Time limit: {}",
            format_remaining(attempt.expires_at, attempt.created_at)
        ))
        .line("Run `check` once the transfer is in a block."))
}

async fn check(node: &GateNode, request: &CommandRequest) -> Result<Reply, NodeError> {
    let outcome = node.machine.poll_and_resolve(&request.subject).await?;
    let reply = match outcome {
        PollOutcome::Verified { user, transfer } => {
            node.metrics.verifications_completed.inc();
            let mut reply = Reply::success("Verification Successful!")
                .line("Your wallet has been verified successfully.")
                .line(format!("Transaction hash: {}", transfer.tx_hash))
                .line(format!("Block number: {}", transfer.block_height));
            if let Some(role) = grant_verification_role(node, &user.subject).await {
                reply = reply.line(format!("Granted role {role}"));
            }
            reply
        }
        PollOutcome::NotFound { attempt } => {
            node.metrics.polls_not_found.inc();
            Reply::failure(
                "Transaction not found. Please make sure you transferred the exact amount to yourself and try again.",
            )
            .line(format!(
                "Time remaining: {}",
                format_remaining(attempt.expires_at, node.clock.now())
            ))
        }
        PollOutcome::NoActiveAttempt => Reply::failure(
            "No active verification found or verification expired. Please start a new verification.",
        ),
        PollOutcome::LedgerUnavailable { reason } => {
            node.metrics.ledger_unavailable.inc();
            tracing::warn!(subject = %request.subject, %reason, "ledger unavailable for check");
            Reply::failure("Error checking verification. Please try again later.")
        }
    };
    Ok(reply)
}

/// Grant the configured verification role, returning it when newly granted.
///
/// Nothing here fails the command: a missing role, a subject who left the
/// group or a refused grant is only logged.
async fn grant_verification_role(node: &GateNode, subject: &SubjectId) -> Option<RoleId> {
    let role = match node.store.load_settings() {
        Ok(settings) => settings.verification_role,
        Err(e) => {
            tracing::warn!(error = %e, "could not load settings");
            None
        }
    };
    let Some(role) = role else {
        tracing::info!(%subject, "no verification role configured");
        return None;
    };

    let roles = BTreeSet::from([role.clone()]);
    match node.role_sync.grant_missing(&node.guild, subject, &roles).await {
        Ok(report) if !report.granted.is_empty() => {
            node.metrics.roles_granted.inc_by(report.granted.len() as u64);
            Some(role)
        }
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(%subject, %role, error = %e, "could not grant verification role");
            None
        }
    }
}

async fn check_nfts(node: &GateNode, request: &CommandRequest) -> Result<Reply, NodeError> {
    let report = match node
        .holdings
        .check(&request.subject, request.arg("address"))
        .await
    {
        Ok(report) => report,
        Err(VerificationError::NotVerified(_)) => {
            return Ok(Reply::failure(
                "You need to be verified first or provide an address. Use `verify` to verify your wallet.",
            ))
        }
        Err(VerificationError::InvalidAddress(_)) => {
            return Ok(Reply::failure(
                "Invalid Unique Network address format. Please provide a valid address.",
            ))
        }
        Err(VerificationError::Ledger(e)) => {
            tracing::warn!(subject = %request.subject, error = %e, "inventory lookup failed");
            return Ok(Reply::failure("Error checking NFTs. Please try again later."));
        }
        Err(e) => return Err(e.into()),
    };

    if report.inventory.is_empty() {
        return Ok(Reply::success("No NFTs found for this address."));
    }

    let total = report.inventory.len();
    let mut reply = Reply::success("Your NFT Collection").line(format!(
        "Found {total} NFTs for address: {}",
        short_address(report.address.as_str())
    ));
    for (i, nft) in report.inventory.iter().take(NFT_PREVIEW).enumerate() {
        reply = reply.line(format!(
            "NFT #{}: collection {}, token {}",
            i + 1,
            nft.collection_id,
            nft.token_id
        ));
    }
    if total > NFT_PREVIEW {
        reply = reply.line(format!("And {} more NFTs...", total - NFT_PREVIEW));
    }
    for description in &report.grant.descriptions {
        reply = reply.line(format!("Eligible: {description}"));
    }

    if report.verified && !report.grant.is_empty() {
        match node
            .role_sync
            .grant_missing(&node.guild, &request.subject, &report.grant.roles)
            .await
        {
            Ok(grants) => {
                node.metrics.roles_granted.inc_by(grants.granted.len() as u64);
                if !grants.granted.is_empty() {
                    let names: Vec<_> = grants.granted.iter().map(|r| r.to_string()).collect();
                    reply = reply.line(format!("Roles granted: {}", names.join(", ")));
                }
            }
            Err(e) => {
                tracing::warn!(subject = %request.subject, error = %e, "could not apply NFT roles");
            }
        }
    }
    Ok(reply)
}

async fn status(node: &GateNode, request: &CommandRequest) -> Result<Reply, NodeError> {
    let Some(report) = node.machine.status(&request.subject)? else {
        return Ok(Reply::failure(
            "You haven't started verification yet. Use `verify` to begin.",
        ));
    };

    let mut reply = Reply::success("Verification Status");
    match &report.user {
        Some(user) if user.is_verified() => {
            reply = reply
                .line("Status: Verified")
                .line(format!("Address: {}", user.address))
                .line(format!("Verified at: {}", user.updated_at));
        }
        Some(user) => {
            reply = reply
                .line("Status: Pending")
                .line(format!("Address: {}", user.address))
                .line("Verified at: Not verified yet");
        }
        None => reply = reply.line("Status: Pending"),
    }
    if !report.holdings.is_empty() {
        reply = reply.line(format!("NFTs verified: {}", report.holdings.len()));
    }
    if let Some(attempt) = &report.active_attempt {
        reply = reply.line(format!(
            "Active attempt: {} UNQ from {}, {} left",
            format_amount(&attempt.amount),
            short_address(attempt.address.as_str()),
            format_remaining(attempt.expires_at, node.clock.now())
        ));
    }
    Ok(reply)
}

async fn admin_set_role(node: &GateNode, request: &CommandRequest) -> Result<Reply, NodeError> {
    if !node.is_admin(&request.subject) {
        return Ok(Reply::failure(DENIED));
    }
    let Some(role) = request.arg("role") else {
        return Ok(Reply::missing_arg("role"));
    };

    let mut settings = node.store.load_settings()?;
    settings.verification_role = Some(RoleId::from(role));
    node.store.save_settings(&settings)?;
    tracing::info!(admin = %request.subject, %role, "verification role updated");
    Ok(Reply::success(format!("Verification role set to {role}")))
}

async fn sync_role(node: &GateNode, request: &CommandRequest) -> Result<Reply, NodeError> {
    if !node.is_admin(&request.subject) {
        return Ok(Reply::failure(DENIED));
    }
    let Some(role) = node.store.load_settings()?.verification_role else {
        return Ok(Reply::failure(
            "No verification role configured. Please use `admin-setrole` first.",
        ));
    };

    let report = node.role_sync.sync(&node.guild, &role).await?;
    node.metrics.roles_granted.inc_by(report.assigned as u64);
    Ok(Reply::success("Role Sync Complete")
        .line(format!("Total verified users: {}", report.total))
        .line(format!("Roles assigned: {}", report.assigned))
        .line(format!("Already had role: {}", report.already_had))
        .line(format!("Errors: {}", report.errors)))
}
