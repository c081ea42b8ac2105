//! Wallet ownership verification by self-transfer.
//!
//! A subject asks to verify an address and is told to send a specific amount
//! from that address to itself before a deadline. Polling scans recent blocks
//! for the transfer; a match marks the subject verified. Attempts that run out
//! of time are invisible to polling at once and removed by the periodic sweep.
//!
//! States, per subject:
//! - NONE: no live attempt
//! - PENDING: a live attempt exists
//! - VERIFIED: the user record says so; sticky, never downgraded
//!
//! EXPIRED is never stored. It is how a PENDING attempt reads once its
//! deadline has passed.

pub mod config;
pub mod error;
pub mod holdings;
pub mod machine;
pub mod outcomes;

pub use config::VerificationConfig;
pub use error::VerificationError;
pub use holdings::{HoldingsCheck, HoldingsReport};
pub use machine::VerificationMachine;
pub use outcomes::{PollOutcome, StatusReport, SweepReport};
