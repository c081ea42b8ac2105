//! Prometheus metrics for the gate.
//!
//! [`GateMetrics`] owns its own [`Registry`]; [`GateMetrics::encode`] renders
//! it in the text exposition format.

use prometheus::{
    register_int_counter_vec_with_registry, register_int_counter_with_registry, Encoder,
    IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::NodeError;

pub struct GateMetrics {
    pub registry: Registry,

    /// Commands dispatched, by command name.
    pub commands: IntCounterVec,
    pub verifications_requested: IntCounter,
    pub verifications_completed: IntCounter,
    /// Polls that did not find the transfer yet.
    pub polls_not_found: IntCounter,
    pub ledger_unavailable: IntCounter,
    pub attempts_swept: IntCounter,
    pub roles_granted: IntCounter,
}

impl GateMetrics {
    pub fn new() -> Result<Self, NodeError> {
        let registry = Registry::new();

        let commands = register_int_counter_vec_with_registry!(
            Opts::new("unqgate_commands_total", "Commands dispatched"),
            &["command"],
            registry
        )?;
        let verifications_requested = register_int_counter_with_registry!(
            Opts::new(
                "unqgate_verifications_requested_total",
                "Verification attempts created"
            ),
            registry
        )?;
        let verifications_completed = register_int_counter_with_registry!(
            Opts::new(
                "unqgate_verifications_completed_total",
                "Polls that found the self-transfer"
            ),
            registry
        )?;
        let polls_not_found = register_int_counter_with_registry!(
            Opts::new(
                "unqgate_polls_not_found_total",
                "Polls that did not find the self-transfer"
            ),
            registry
        )?;
        let ledger_unavailable = register_int_counter_with_registry!(
            Opts::new(
                "unqgate_ledger_unavailable_total",
                "Polls abandoned because the ledger was unreachable"
            ),
            registry
        )?;
        let attempts_swept = register_int_counter_with_registry!(
            Opts::new("unqgate_attempts_swept_total", "Expired attempts deleted"),
            registry
        )?;
        let roles_granted = register_int_counter_with_registry!(
            Opts::new("unqgate_roles_granted_total", "Roles granted to members"),
            registry
        )?;

        Ok(Self {
            registry,
            commands,
            verifications_requested,
            verifications_completed,
            polls_not_found,
            ledger_unavailable,
            attempts_swept,
            roles_granted,
        })
    }

    pub fn encode(&self) -> Result<String, NodeError> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| NodeError::Config(format!("metrics not UTF-8: {e}")))
    }
}
