//! Cryptographic helpers for unqgate.
//!
//! - **Blake2b-512** hashing over several byte slices
//! - **SS58** account addresses: base58 with a network prefix and a
//!   Blake2b-512 checksum, the format used by Substrate chains
//!
//! No key material is ever handled here; ownership is proven on-chain.

pub mod hash;
pub mod ss58;

pub use hash::blake2b_512_multi;
pub use ss58::{decode_ss58, encode_ss58, validate_address, UNIQUE_PREFIX};
