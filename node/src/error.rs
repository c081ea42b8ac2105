use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("config error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] unqgate_store::StoreError),

    #[error("verification error: {0}")]
    Verification(#[from] unqgate_verification::VerificationError),

    #[error("role error: {0}")]
    Role(#[from] unqgate_roles::RoleError),

    #[error("group error: {0}")]
    Group(#[from] unqgate_groups::GroupError),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("logging already initialised: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
