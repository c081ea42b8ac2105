//! The gate service: storage, ledger, group membership and configuration
//! wired together behind one command entry point.

use std::sync::Arc;

use tokio::task::JoinHandle;

use unqgate_groups::MembershipProvider;
use unqgate_ledger::LedgerClient;
use unqgate_roles::{RoleMapper, RoleSync};
use unqgate_store::HoldingsStore;
use unqgate_types::{Clock, GroupId, SubjectId};
use unqgate_verification::{HoldingsCheck, VerificationMachine};

use crate::commands::{CommandRequest, CommandRouter, Reply};
use crate::{spawn_sweeper, GateMetrics, NodeConfig, NodeError, ShutdownController};

pub type Machine = VerificationMachine<dyn HoldingsStore, dyn LedgerClient>;

pub struct GateNode {
    pub config: NodeConfig,
    pub(crate) store: Arc<dyn HoldingsStore>,
    pub(crate) machine: Arc<Machine>,
    pub(crate) holdings: HoldingsCheck<dyn HoldingsStore, dyn LedgerClient>,
    pub(crate) role_sync: RoleSync<dyn HoldingsStore, dyn MembershipProvider>,
    pub(crate) guild: GroupId,
    pub(crate) clock: Arc<dyn Clock>,
    pub metrics: Arc<GateMetrics>,
    router: CommandRouter,
    task_handles: Vec<JoinHandle<()>>,
}

impl GateNode {
    pub fn new(
        config: NodeConfig,
        store: Arc<dyn HoldingsStore>,
        ledger: Arc<dyn LedgerClient>,
        membership: Arc<dyn MembershipProvider>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, NodeError> {
        config.validate()?;
        let verification = config.verification_config();
        let call_timeout = verification.ledger_call_timeout;

        let machine = Arc::new(VerificationMachine::new(
            Arc::clone(&store),
            Arc::clone(&ledger),
            Arc::clone(&clock),
            verification,
        ));
        let holdings = HoldingsCheck::new(
            Arc::clone(&store),
            ledger,
            RoleMapper::new(&config.roles),
            Arc::clone(&clock),
            call_timeout,
        );
        let role_sync = RoleSync::new(Arc::clone(&store), membership);
        let guild = GroupId::new(config.discord.guild_id.clone());

        Ok(Self {
            config,
            store,
            machine,
            holdings,
            role_sync,
            guild,
            clock,
            metrics: Arc::new(GateMetrics::new()?),
            router: CommandRouter::builtin(),
            task_handles: Vec::new(),
        })
    }

    /// Dispatch one command. Failures become an error reply; they are never
    /// propagated to the caller.
    pub async fn dispatch(&self, request: &CommandRequest) -> Reply {
        let Some(handler) = self.router.get(&request.name) else {
            tracing::debug!(command = %request.name, "unknown command");
            return Reply::failure("Unknown command");
        };
        self.metrics
            .commands
            .with_label_values(&[request.name.as_str()])
            .inc();

        match handler(self, request).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(
                    command = %request.name,
                    subject = %request.subject,
                    error = %e,
                    "command failed"
                );
                Reply::failure("An error occurred while processing your command.")
            }
        }
    }

    pub fn machine(&self) -> &Arc<Machine> {
        &self.machine
    }

    pub(crate) fn is_admin(&self, subject: &SubjectId) -> bool {
        self.config
            .discord
            .admin_user_id
            .as_deref()
            .is_some_and(|admin| admin == subject.as_str())
    }

    /// Start background tasks. Each one stops when `shutdown` fires.
    pub fn start(&mut self, shutdown: &ShutdownController) {
        let handle = spawn_sweeper(
            Arc::clone(&self.machine),
            self.config.sweep_interval(),
            Arc::clone(&self.metrics),
            shutdown.subscribe(),
        );
        self.task_handles.push(handle);
        tracing::info!(
            guild = %self.guild,
            sweep_interval_secs = self.config.verification.sweep_interval_secs,
            "gate started"
        );
    }

    /// Wait for every background task to finish.
    pub async fn join(&mut self) {
        for handle in self.task_handles.drain(..) {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "background task ended abnormally");
            }
        }
    }
}
