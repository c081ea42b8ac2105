//! NFT inventory to role set.
//!
//! All rules are additive:
//! 1. each distinct collection with a rule grants that rule's role
//! 2. each held `(collection, token)` pair with a rule grants that rule's role
//! 3. exactly one quantity tier applies: the highest threshold not above the
//!    inventory size, counting repeated entries individually

use std::collections::{BTreeSet, HashMap, HashSet};

use unqgate_types::{NftRef, RoleId};

use crate::rules::{CollectionRule, QuantityTier, RoleRules, SpecialTokenRule};

/// Roles earned by an inventory plus one description per matching rule.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoleGrant {
    pub roles: BTreeSet<RoleId>,
    pub descriptions: Vec<String>,
}

impl RoleGrant {
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct RoleMapper {
    collections: HashMap<u32, CollectionRule>,
    special_tokens: HashMap<NftRef, SpecialTokenRule>,
    /// Highest threshold first.
    tiers: Vec<QuantityTier>,
}

impl RoleMapper {
    pub fn new(rules: &RoleRules) -> Self {
        let collections = rules
            .collections
            .iter()
            .map(|r| (r.collection_id, r.clone()))
            .collect();
        let special_tokens = rules
            .special_tokens
            .iter()
            .map(|r| (NftRef::new(r.collection_id, r.token_id), r.clone()))
            .collect();
        let mut tiers = rules.quantity_tiers.clone();
        tiers.sort_by(|a, b| b.min_count.cmp(&a.min_count));
        Self {
            collections,
            special_tokens,
            tiers,
        }
    }

    /// The quantity tier for an inventory of `count` NFTs, if any.
    pub fn quantity_tier(&self, count: usize) -> Option<&QuantityTier> {
        self.tiers.iter().find(|t| t.min_count <= count)
    }

    pub fn map_roles(&self, inventory: &[NftRef]) -> RoleGrant {
        let mut grant = RoleGrant::default();

        let mut seen_collections = HashSet::new();
        for nft in inventory {
            if !seen_collections.insert(nft.collection_id) {
                continue;
            }
            if let Some(rule) = self.collections.get(&nft.collection_id) {
                grant.roles.insert(rule.role_id.clone());
                grant.descriptions.push(describe(&rule.name, &rule.description));
            }
        }

        let mut seen_tokens = HashSet::new();
        for nft in inventory {
            if !seen_tokens.insert(*nft) {
                continue;
            }
            if let Some(rule) = self.special_tokens.get(nft) {
                grant.roles.insert(rule.role_id.clone());
                grant.descriptions.push(describe(&rule.name, &rule.description));
            }
        }

        if let Some(tier) = self.quantity_tier(inventory.len()) {
            grant.roles.insert(tier.role_id.clone());
            grant.descriptions.push(describe(&tier.name, &tier.description));
        }

        grant
    }
}

fn describe(name: &str, description: &str) -> String {
    if description.is_empty() {
        name.to_string()
    } else {
        description.to_string()
    }
}
