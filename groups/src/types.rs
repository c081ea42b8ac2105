use serde::{Deserialize, Serialize};
use unqgate_types::{RoleId, SubjectId};

/// A resolved member of a group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub subject: SubjectId,
    pub display_name: String,
    /// Roles held at resolution time.
    pub roles: Vec<RoleId>,
}

impl Member {
    pub fn has_role(&self, role: &RoleId) -> bool {
        self.roles.contains(role)
    }
}
