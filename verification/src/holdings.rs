//! NFT holdings check.

use std::sync::Arc;
use std::time::Duration;

use unqgate_ledger::{LedgerClient, LedgerError};
use unqgate_roles::{RoleGrant, RoleMapper};
use unqgate_store::HoldingsStore;
use unqgate_types::{ChainAddress, Clock, NftRef, SubjectId};

use crate::VerificationError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HoldingsReport {
    pub address: ChainAddress,
    pub inventory: Vec<NftRef>,
    /// Roles the inventory earns under the configured rules.
    pub grant: RoleGrant,
    pub verified: bool,
    /// Holdings written to the store; zero unless the subject is verified.
    pub recorded: usize,
}

/// Looks up what an address holds and what roles that earns.
pub struct HoldingsCheck<S: ?Sized, L: ?Sized> {
    store: Arc<S>,
    ledger: Arc<L>,
    mapper: RoleMapper,
    clock: Arc<dyn Clock>,
    call_timeout: Duration,
}

impl<S, L> HoldingsCheck<S, L>
where
    S: HoldingsStore + ?Sized,
    L: LedgerClient + ?Sized,
{
    pub fn new(
        store: Arc<S>,
        ledger: Arc<L>,
        mapper: RoleMapper,
        clock: Arc<dyn Clock>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            store,
            ledger,
            mapper,
            clock,
            call_timeout,
        }
    }

    /// Check `address`, or the subject's verified address when none is given.
    ///
    /// Holdings are recorded only for verified subjects; anyone may look.
    pub async fn check(
        &self,
        subject: &SubjectId,
        address: Option<&str>,
    ) -> Result<HoldingsReport, VerificationError> {
        let user = self.store.get_user(subject)?;
        let verified = user.as_ref().is_some_and(|u| u.is_verified());

        let address = match (address, &user) {
            (Some(address), _) => {
                if !self.ledger.validate_address_format(address) {
                    return Err(VerificationError::InvalidAddress(address.to_string()));
                }
                ChainAddress::from(address)
            }
            (None, Some(user)) if verified => user.address.clone(),
            (None, _) => return Err(VerificationError::NotVerified(subject.to_string())),
        };

        let inventory = tokio::time::timeout(
            self.call_timeout,
            self.ledger.tokens_owned_by(address.as_str()),
        )
        .await
        .map_err(|_| LedgerError::Timeout(self.call_timeout.as_secs()))??;
        let grant = self.mapper.map_roles(&inventory);

        let mut recorded = 0;
        if verified {
            let now = self.clock.now();
            for nft in &inventory {
                self.store.add_holding(subject, *nft, now)?;
                recorded += 1;
            }
        }
        tracing::info!(
            %subject,
            %address,
            held = inventory.len(),
            roles = grant.roles.len(),
            recorded,
            "holdings checked"
        );

        Ok(HoldingsReport {
            address,
            inventory,
            grant,
            verified,
            recorded,
        })
    }
}
