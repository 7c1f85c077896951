use tokio::sync::mpsc;

use quickchat_shared::ReducerCall;

use crate::error::NetError;

/// Commands sent *into* a live session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Declare interest in the given relation queries.
    Subscribe(Vec<String>),
    /// Invoke a reducer. The outcome arrives later as a
    /// `ClientEvent::ReducerResult`.
    CallReducer(ReducerCall),
    /// Close the session from the client side.
    Disconnect,
}

/// Cheap, cloneable sender half of a live session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<SessionCommand>,
}

impl SessionHandle {
    /// Wrap the command channel of a transport's session task.
    pub fn new(tx: mpsc::UnboundedSender<SessionCommand>) -> Self {
        Self { tx }
    }

    /// A handle paired with the receiver it feeds, for transports and tests.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SessionCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn subscribe(&self, queries: Vec<String>) -> Result<(), NetError> {
        self.send(SessionCommand::Subscribe(queries))
    }

    /// Fire-and-forget: returns as soon as the call is queued.
    pub fn call_reducer(&self, call: ReducerCall) -> Result<(), NetError> {
        self.send(SessionCommand::CallReducer(call))
    }

    pub fn disconnect(&self) -> Result<(), NetError> {
        self.send(SessionCommand::Disconnect)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn send(&self, cmd: SessionCommand) -> Result<(), NetError> {
        self.tx.send(cmd).map_err(|_| NetError::SessionClosed)
    }
}
