//! Nullable group-membership provider.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use unqgate_groups::{GroupError, Member, MembershipProvider};
use unqgate_types::{GroupId, RoleId, SubjectId};

/// An in-memory guild. Grants are applied to the stored member and recorded.
#[derive(Default)]
pub struct NullMembership {
    members: Mutex<HashMap<(GroupId, SubjectId), Member>>,
    failing_resolve: Mutex<HashSet<SubjectId>>,
    failing_grant: Mutex<HashSet<SubjectId>>,
    grants: Mutex<Vec<(GroupId, SubjectId, RoleId)>>,
}

impl NullMembership {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_member(&self, group: &GroupId, subject: &str, roles: &[&str]) {
        let member = Member {
            subject: SubjectId::from(subject),
            display_name: subject.to_string(),
            roles: roles.iter().map(|r| RoleId::from(*r)).collect(),
        };
        self.members
            .lock()
            .unwrap()
            .insert((group.clone(), member.subject.clone()), member);
    }

    pub fn fail_resolve(&self, subject: &str) {
        self.failing_resolve
            .lock()
            .unwrap()
            .insert(SubjectId::from(subject));
    }

    pub fn fail_grant(&self, subject: &str) {
        self.failing_grant
            .lock()
            .unwrap()
            .insert(SubjectId::from(subject));
    }

    /// Every successful grant, in order.
    pub fn grants(&self) -> Vec<(GroupId, SubjectId, RoleId)> {
        self.grants.lock().unwrap().clone()
    }

    pub fn roles_of(&self, group: &GroupId, subject: &str) -> Vec<RoleId> {
        self.members
            .lock()
            .unwrap()
            .get(&(group.clone(), SubjectId::from(subject)))
            .map(|m| m.roles.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl MembershipProvider for NullMembership {
    async fn resolve_member(
        &self,
        group: &GroupId,
        subject: &SubjectId,
    ) -> Result<Option<Member>, GroupError> {
        if self.failing_resolve.lock().unwrap().contains(subject) {
            return Err(GroupError::Unreachable("injected failure".into()));
        }
        Ok(self
            .members
            .lock()
            .unwrap()
            .get(&(group.clone(), subject.clone()))
            .cloned())
    }

    async fn grant_role(
        &self,
        group: &GroupId,
        member: &Member,
        role: &RoleId,
    ) -> Result<(), GroupError> {
        if self.failing_grant.lock().unwrap().contains(&member.subject) {
            return Err(GroupError::Forbidden(format!("grant role {role}")));
        }
        let mut members = self.members.lock().unwrap();
        let stored = members
            .get_mut(&(group.clone(), member.subject.clone()))
            .ok_or_else(|| GroupError::RequestFailed(format!("unknown member {}", member.subject)))?;
        if !stored.roles.contains(role) {
            stored.roles.push(role.clone());
        }
        self.grants
            .lock()
            .unwrap()
            .push((group.clone(), member.subject.clone(), role.clone()));
        Ok(())
    }
}
