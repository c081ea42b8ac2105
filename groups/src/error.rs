use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GroupError {
    #[error("group {0} not found")]
    GroupNotFound(String),

    #[error("role {0} not found")]
    RoleNotFound(String),

    #[error("missing permission: {0}")]
    Forbidden(String),

    #[error("HTTP request to group API failed: {0}")]
    RequestFailed(String),

    #[error("invalid response from group API: {0}")]
    InvalidResponse(String),

    #[error("group API unreachable: {0}")]
    Unreachable(String),
}
