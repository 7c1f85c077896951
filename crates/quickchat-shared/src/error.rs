use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Invalid identity: {0}")]
    InvalidIdentity(String),

    #[error("Hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
