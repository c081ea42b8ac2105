//! The verification state machine.

use std::sync::Arc;

use unqgate_ledger::{Detection, LedgerClient, LedgerError, TransferDetector};
use unqgate_store::{
    HoldingsStore, NewAttempt, StoreError, User, VerificationAttempt, VerificationStatus,
};
use unqgate_types::{ChainAddress, Clock, SubjectId, TokenAmount};

use crate::{PollOutcome, StatusReport, SweepReport, VerificationConfig, VerificationError};

pub struct VerificationMachine<S: ?Sized, L: ?Sized> {
    store: Arc<S>,
    detector: TransferDetector<L>,
    clock: Arc<dyn Clock>,
    config: VerificationConfig,
}

impl<S, L> VerificationMachine<S, L>
where
    S: HoldingsStore + ?Sized,
    L: LedgerClient + ?Sized,
{
    pub fn new(
        store: Arc<S>,
        ledger: Arc<L>,
        clock: Arc<dyn Clock>,
        config: VerificationConfig,
    ) -> Self {
        let detector = TransferDetector::with_timeout(ledger, config.ledger_call_timeout);
        Self {
            store,
            detector,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &VerificationConfig {
        &self.config
    }

    /// Start an attempt for `subject` to prove control of `address`.
    ///
    /// Validation happens before anything is written. Earlier attempts are
    /// left alone; polling always reads the newest live one.
    pub async fn request_verification(
        &self,
        subject: &SubjectId,
        address: &str,
        amount: Option<TokenAmount>,
    ) -> Result<VerificationAttempt, VerificationError> {
        let amount = amount.unwrap_or(self.config.amount);
        if amount.is_zero() || amount > self.config.max_amount {
            return Err(VerificationError::AmountOutOfRange(format!(
                "{amount} is not in (0, {}]",
                self.config.max_amount
            )));
        }

        let ledger = self.detector.ledger();
        if !ledger.validate_address_format(address) {
            return Err(VerificationError::InvalidAddress(address.to_string()));
        }

        let decimals = tokio::time::timeout(self.config.ledger_call_timeout, ledger.native_decimals())
            .await
            .map_err(|_| LedgerError::Timeout(self.config.ledger_call_timeout.as_secs()))??;
        if amount.to_raw(decimals).is_err() {
            return Err(VerificationError::AmountOutOfRange(format!(
                "{amount} has more precision than the chain's {decimals} decimals"
            )));
        }

        let now = self.clock.now();
        let attempt = self.store.put_attempt(NewAttempt {
            subject: subject.clone(),
            address: ChainAddress::from(address),
            amount,
            created_at: now,
            expires_at: now.plus_secs(self.config.timeout_secs),
        })?;
        tracing::info!(
            %subject,
            attempt = %attempt.id,
            %amount,
            expires_at = attempt.expires_at.as_secs(),
            "verification requested"
        );
        Ok(attempt)
    }

    /// Check whether the subject's live attempt has been satisfied.
    ///
    /// A miss changes nothing, so the subject can poll again until the attempt
    /// expires. A hit makes sure a user record exists, then marks it verified,
    /// then retires the attempt.
    pub async fn poll_and_resolve(
        &self,
        subject: &SubjectId,
    ) -> Result<PollOutcome, VerificationError> {
        let now = self.clock.now();
        let Some(attempt) = self.store.get_attempt(subject, now)? else {
            tracing::debug!(%subject, "no active attempt");
            return Ok(PollOutcome::NoActiveAttempt);
        };

        let transfer = match self
            .detector
            .detect(
                &attempt.address,
                &attempt.address,
                &attempt.amount,
                self.config.scan_window,
            )
            .await
        {
            Detection::Found(transfer) => transfer,
            Detection::NotFound => {
                tracing::debug!(%subject, attempt = %attempt.id, "transfer not seen yet");
                return Ok(PollOutcome::NotFound { attempt });
            }
            Detection::Unreachable { reason } => {
                return Ok(PollOutcome::LedgerUnavailable { reason });
            }
        };

        let now = self.clock.now();
        let user = self.ensure_user(&attempt)?;
        let user = if user.is_verified() {
            user
        } else {
            self.store
                .update_user_status(subject, VerificationStatus::Verified, now)?
        };

        if !self.store.delete_attempt(attempt.id)? {
            tracing::debug!(attempt = %attempt.id, "attempt already removed");
        }
        tracing::info!(
            %subject,
            address = %user.address,
            block = transfer.block_height,
            operation = %transfer.operation_ref,
            "subject verified"
        );
        Ok(PollOutcome::Verified { user, transfer })
    }

    /// The user record for the attempt's subject, created pending if missing.
    ///
    /// A pending record left behind by an earlier attempt takes on this
    /// attempt's address and amount, so the status flip verifies what was
    /// actually proven. Verified records are never rewritten.
    fn ensure_user(&self, attempt: &VerificationAttempt) -> Result<User, VerificationError> {
        let now = self.clock.now();
        if let Some(user) = self.store.get_user(&attempt.subject)? {
            if user.is_verified()
                || (user.address == attempt.address
                    && user.verification_amount == attempt.amount
                    && user.verification_expires_at == attempt.expires_at)
            {
                return Ok(user);
            }
            tracing::debug!(
                subject = %attempt.subject,
                stale = %user.address,
                address = %attempt.address,
                "refreshing pending user from attempt"
            );
            let refreshed = User {
                address: attempt.address.clone(),
                verification_amount: attempt.amount,
                verification_expires_at: attempt.expires_at,
                updated_at: now,
                ..user
            };
            self.store.replace_user(&refreshed)?;
            return Ok(refreshed);
        }
        let user = User {
            subject: attempt.subject.clone(),
            address: attempt.address.clone(),
            status: VerificationStatus::Pending,
            verification_amount: attempt.amount,
            verification_expires_at: attempt.expires_at,
            created_at: now,
            updated_at: now,
        };
        match self.store.put_user(&user) {
            Ok(()) => Ok(user),
            // A concurrent poll for the same subject got there first.
            Err(StoreError::Duplicate(_)) => self
                .store
                .get_user(&attempt.subject)?
                .ok_or_else(|| StoreError::NotFound(attempt.subject.to_string()).into()),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete every attempt whose deadline has passed.
    ///
    /// An attempt that is already gone (resolved or swept concurrently) is not
    /// an error, and one failed delete does not stop the rest.
    pub fn sweep_expired(&self) -> Result<SweepReport, VerificationError> {
        let now = self.clock.now();
        let expired = self.store.list_expired_attempts(now)?;
        let mut report = SweepReport {
            scanned: expired.len(),
            ..Default::default()
        };
        for attempt in &expired {
            match self.store.delete_attempt(attempt.id) {
                Ok(true) => report.deleted += 1,
                Ok(false) => tracing::debug!(attempt = %attempt.id, "already removed"),
                Err(e) => {
                    tracing::warn!(attempt = %attempt.id, error = %e, "failed to delete expired attempt");
                    report.failed += 1;
                }
            }
        }
        if report.scanned > 0 {
            tracing::info!(
                scanned = report.scanned,
                deleted = report.deleted,
                "swept expired attempts"
            );
        }
        Ok(report)
    }

    /// What the gate knows about `subject`, `None` if nothing at all.
    pub fn status(&self, subject: &SubjectId) -> Result<Option<StatusReport>, VerificationError> {
        let user = self.store.get_user(subject)?;
        let active_attempt = self.store.get_attempt(subject, self.clock.now())?;
        if user.is_none() && active_attempt.is_none() {
            return Ok(None);
        }
        let holdings = match &user {
            Some(u) if u.is_verified() => self.store.list_holdings(subject)?,
            _ => Vec::new(),
        };
        Ok(Some(StatusReport {
            user,
            holdings,
            active_attempt,
        }))
    }
}
