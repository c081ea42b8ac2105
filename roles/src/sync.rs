//! Role sync orchestration.

use std::collections::BTreeSet;
use std::sync::Arc;

use unqgate_groups::MembershipProvider;
use unqgate_store::UserStore;
use unqgate_types::{GroupId, RoleId, SubjectId};

use crate::RoleError;

/// Outcome of a sync over every verified user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub total: usize,
    pub assigned: usize,
    pub already_had: usize,
    pub errors: usize,
}

/// Outcome of granting a role set to one member.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GrantReport {
    pub granted: Vec<RoleId>,
    pub already_had: Vec<RoleId>,
    pub failed: Vec<(RoleId, String)>,
}

pub struct RoleSync<S: ?Sized, M: ?Sized> {
    store: Arc<S>,
    membership: Arc<M>,
}

impl<S, M> RoleSync<S, M>
where
    S: UserStore + Send + Sync + ?Sized,
    M: MembershipProvider + ?Sized,
{
    pub fn new(store: Arc<S>, membership: Arc<M>) -> Self {
        Self { store, membership }
    }

    /// Make sure every verified user in `group` holds `role`.
    ///
    /// Idempotent: members who already hold the role are counted, not touched.
    /// A member who cannot be resolved or granted counts as an error and the
    /// sync moves on.
    pub async fn sync(&self, group: &GroupId, role: &RoleId) -> Result<SyncReport, RoleError> {
        let users = self.store.list_verified_users()?;
        let mut report = SyncReport {
            total: users.len(),
            ..Default::default()
        };
        tracing::info!(%group, %role, total = report.total, "syncing verification role");

        for user in &users {
            let member = match self.membership.resolve_member(group, &user.subject).await {
                Ok(Some(member)) => member,
                Ok(None) => {
                    tracing::warn!(subject = %user.subject, "verified user is not a group member");
                    report.errors += 1;
                    continue;
                }
                Err(e) => {
                    tracing::warn!(subject = %user.subject, error = %e, "could not resolve member");
                    report.errors += 1;
                    continue;
                }
            };

            if self.membership.member_has_role(&member, role) {
                tracing::debug!(subject = %user.subject, "already has role");
                report.already_had += 1;
                continue;
            }

            match self.membership.grant_role(group, &member, role).await {
                Ok(()) => report.assigned += 1,
                Err(e) => {
                    tracing::warn!(subject = %user.subject, error = %e, "role grant failed");
                    report.errors += 1;
                }
            }
        }

        tracing::info!(
            assigned = report.assigned,
            already_had = report.already_had,
            errors = report.errors,
            "role sync complete"
        );
        Ok(report)
    }

    /// Grant each of `roles` the member does not hold yet.
    pub async fn grant_missing(
        &self,
        group: &GroupId,
        subject: &SubjectId,
        roles: &BTreeSet<RoleId>,
    ) -> Result<GrantReport, RoleError> {
        let member = self
            .membership
            .resolve_member(group, subject)
            .await?
            .ok_or_else(|| RoleError::NotAMember {
                group: group.to_string(),
                subject: subject.to_string(),
            })?;

        let mut report = GrantReport::default();
        for role in roles {
            if self.membership.member_has_role(&member, role) {
                report.already_had.push(role.clone());
                continue;
            }
            match self.membership.grant_role(group, &member, role).await {
                Ok(()) => report.granted.push(role.clone()),
                Err(e) => {
                    tracing::warn!(%subject, %role, error = %e, "role grant failed");
                    report.failed.push((role.clone(), e.to_string()));
                }
            }
        }
        Ok(report)
    }
}
