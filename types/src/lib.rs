//! Fundamental types for the unqgate verification gate.
//!
//! This crate defines the types shared by every other crate in the workspace:
//! subject and account identifiers, fixed-point token amounts, NFT references,
//! timestamps and the clock abstraction.

pub mod amount;
pub mod error;
pub mod id;
pub mod time;

pub use amount::TokenAmount;
pub use error::TypeError;
pub use id::{ChainAddress, GroupId, NftRef, RoleId, SubjectId};
pub use time::{Clock, SystemClock, Timestamp};
