use async_trait::async_trait;
use unqgate_types::{GroupId, RoleId, SubjectId};

use crate::{GroupError, Member};

#[async_trait]
pub trait MembershipProvider: Send + Sync {
    /// `Ok(None)` when the subject is not a member of the group.
    async fn resolve_member(
        &self,
        group: &GroupId,
        subject: &SubjectId,
    ) -> Result<Option<Member>, GroupError>;

    fn member_has_role(&self, member: &Member, role: &RoleId) -> bool {
        member.has_role(role)
    }

    async fn grant_role(
        &self,
        group: &GroupId,
        member: &Member,
        role: &RoleId,
    ) -> Result<(), GroupError>;
}
