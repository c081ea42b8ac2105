//! The unqgate service.
//!
//! [`GateNode`] wires the verification state machine, the holdings check and
//! role sync to concrete storage, ledger and group-membership backends, and
//! routes named commands to them:
//! - `verify` starts a self-transfer verification
//! - `check` polls the ledger for the transfer
//! - `checknfts` looks up holdings and grants the roles they earn
//! - `status` reports where a subject stands
//! - `admin-setrole` and `sync-role` manage the verification role
//!
//! Expired attempts are swept in the background until shutdown.

pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod node;
pub mod shutdown;
pub mod sweeper;

pub use commands::{CommandRequest, CommandRouter, Handler, Reply};
pub use config::{DiscordSection, LedgerSection, NodeConfig, VerificationSection};
pub use error::NodeError;
pub use logging::{init_logging, LogFormat};
pub use metrics::GateMetrics;
pub use node::{GateNode, Machine};
pub use shutdown::ShutdownController;
pub use sweeper::spawn_sweeper;
