//! Chain access for the verification gate.
//!
//! The gate never indexes the chain. It asks a [`LedgerClient`] for the head
//! height and individual recent blocks, and the [`TransferDetector`] walks a
//! bounded window of them looking for one exact self-transfer.

pub mod client;
pub mod detector;
pub mod error;
pub mod model;
pub mod sidecar;

pub use client::LedgerClient;
pub use detector::{Detection, TransferDetector, TransferMatch};
pub use error::LedgerError;
pub use model::{Block, Call, Operation, TransferVariant};
pub use sidecar::{SidecarClient, SidecarConfig};
