use thiserror::Error;
use unqgate_groups::GroupError;
use unqgate_store::StoreError;

#[derive(Debug, Error)]
pub enum RoleError {
    #[error("invalid role rules: {0}")]
    InvalidRules(String),

    #[error("{subject} is not a member of group {group}")]
    NotAMember { group: String, subject: String },

    #[error("group error: {0}")]
    Group(#[from] GroupError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}
