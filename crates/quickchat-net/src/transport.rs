use async_trait::async_trait;
use tokio::sync::mpsc;

use quickchat_shared::{ClientEvent, Identity};

use crate::error::NetError;
use crate::session::SessionHandle;

/// Where and as whom to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectParams {
    pub uri: String,
    pub module_name: String,
    /// `None` asks the service to mint a new identity and token
    pub token: Option<String>,
}

/// A successfully established session.
#[derive(Debug)]
pub struct Connected {
    pub handle: SessionHandle,
    /// Identity the service assigned to this session
    pub identity: Identity,
    /// Token to persist and present on the next connect
    pub token: String,
    /// Every event for this session, in the order the service applied them.
    /// Closes after a `ClientEvent::Disconnected`.
    pub events: mpsc::UnboundedReceiver<ClientEvent>,
}

/// Establishes sessions with the remote database service.
#[async_trait]
pub trait Transport: Send + 'static {
    async fn connect(&mut self, params: &ConnectParams) -> Result<Connected, NetError>;
}
