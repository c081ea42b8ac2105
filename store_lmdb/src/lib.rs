//! LMDB storage backend for the verification gate.
//!
//! Implements every storage trait from `unqgate-store` using the `heed` LMDB
//! bindings. Each logical store maps to one or more LMDB databases within a
//! single environment, and every mutation commits in its own write transaction.

pub mod attempt;
pub mod environment;
pub mod error;
pub mod holding;
pub mod keys;
pub mod settings;
pub mod user;

pub use environment::LmdbStore;
pub use error::LmdbError;
