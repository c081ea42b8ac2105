//! Role rule configuration.
//!
//! ```toml
//! [[collections]]
//! collection_id = 123
//! role_id = "1100000000000000001"
//! name = "Rare NFT Holder"
//! description = "Holders of NFTs from collection 123"
//!
//! [[special_tokens]]
//! collection_id = 123
//! token_id = 1
//! role_id = "1100000000000000002"
//! name = "Genesis Holder"
//! description = "Holder of the genesis NFT"
//!
//! [[quantity_tiers]]
//! min_count = 5
//! role_id = "1100000000000000003"
//! name = "NFT Collector"
//! description = "Holders of 5 or more NFTs"
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use unqgate_types::RoleId;

use crate::RoleError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionRule {
    pub collection_id: u32,
    pub role_id: RoleId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialTokenRule {
    pub collection_id: u32,
    pub token_id: u32,
    pub role_id: RoleId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityTier {
    /// Inclusive lower bound on the number of NFTs held.
    pub min_count: usize,
    pub role_id: RoleId,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRules {
    #[serde(default)]
    pub collections: Vec<CollectionRule>,
    #[serde(default)]
    pub special_tokens: Vec<SpecialTokenRule>,
    #[serde(default)]
    pub quantity_tiers: Vec<QuantityTier>,
}

impl RoleRules {
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
            && self.special_tokens.is_empty()
            && self.quantity_tiers.is_empty()
    }

    /// Reject rule sets where two rules claim the same key.
    pub fn validate(&self) -> Result<(), RoleError> {
        let mut collections = HashSet::new();
        for rule in &self.collections {
            if !collections.insert(rule.collection_id) {
                return Err(RoleError::InvalidRules(format!(
                    "collection {} has more than one rule",
                    rule.collection_id
                )));
            }
        }
        let mut tokens = HashSet::new();
        for rule in &self.special_tokens {
            if !tokens.insert((rule.collection_id, rule.token_id)) {
                return Err(RoleError::InvalidRules(format!(
                    "token {}:{} has more than one rule",
                    rule.collection_id, rule.token_id
                )));
            }
        }
        let mut thresholds = HashSet::new();
        for tier in &self.quantity_tiers {
            if !thresholds.insert(tier.min_count) {
                return Err(RoleError::InvalidRules(format!(
                    "quantity threshold {} appears more than once",
                    tier.min_count
                )));
            }
        }
        Ok(())
    }
}
