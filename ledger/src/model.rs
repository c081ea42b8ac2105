//! What the gate needs to know about a block: its height and the ordered
//! list of signed operations in it.

use serde::{Deserialize, Serialize};
use unqgate_types::ChainAddress;

/// The balance-transfer calls the chain treats as equivalent for verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferVariant {
    Transfer,
    TransferKeepAlive,
    TransferAllowDeath,
}

impl TransferVariant {
    /// Map a `balances` pallet method name to a transfer variant.
    pub fn from_method(method: &str) -> Option<Self> {
        match method {
            "transfer" => Some(TransferVariant::Transfer),
            "transferKeepAlive" | "transfer_keep_alive" => Some(TransferVariant::TransferKeepAlive),
            "transferAllowDeath" | "transfer_allow_death" => {
                Some(TransferVariant::TransferAllowDeath)
            }
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Call {
    /// A native balance transfer; `value` is in the chain's smallest unit.
    Transfer {
        variant: TransferVariant,
        dest: ChainAddress,
        value: u128,
    },
    Other {
        pallet: String,
        method: String,
    },
    /// The operation was present but its call could not be read.
    Undecodable(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Position within the block.
    pub index: u32,
    pub hash: String,
    /// `None` for unsigned (inherent) operations.
    pub signer: Option<ChainAddress>,
    pub call: Call,
}

impl Operation {
    /// Whether this is a transfer of exactly `value` from `from` to `to`.
    pub fn is_transfer(&self, from: &ChainAddress, to: &ChainAddress, value: u128) -> bool {
        match (&self.signer, &self.call) {
            (Some(signer), Call::Transfer { dest, value: v, .. }) => {
                signer == from && dest == to && *v == value
            }
            _ => false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub height: u64,
    pub hash: String,
    pub operations: Vec<Operation>,
}
