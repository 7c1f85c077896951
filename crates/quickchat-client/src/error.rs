use thiserror::Error;

use quickchat_net::NetError;
use quickchat_store::StoreError;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Network error: {0}")]
    Net(#[from] NetError),

    #[error("Not connected")]
    NotConnected,

    #[error("{0} must not be empty")]
    EmptyInput(&'static str),
}

pub type Result<T> = std::result::Result<T, ClientError>;
