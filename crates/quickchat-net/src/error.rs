use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetError {
    #[error("Connection refused: {0}")]
    ConnectRefused(String),

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Session closed")]
    SessionClosed,
}
