//! Reducer invocation and result correlation.
//!
//! Calls are fire-and-forget.  Results arrive later, out-of-band from row
//! events, and are broadcast to every subscribed client, so only results whose
//! caller is this session are considered.  Of those, only failures are shown:
//! a committed call becomes visible through the row events it caused.
//!
//! Results are matched on `(reducer name, caller identity)` alone.  Two
//! in-flight calls of the same reducer by this session cannot be told apart.

use tracing::{debug, error, warn};

use quickchat_shared::{ReducerCall, ReducerEvent, ReducerStatus};

use crate::error::{ClientError, Result};
use crate::presenter::{LogLevel, Presenter};
use crate::session::Session;

pub struct Correlator<'a, P: Presenter> {
    pub session: &'a Session,
    pub presenter: &'a mut P,
}

impl<'a, P: Presenter> Correlator<'a, P> {
    pub fn new(session: &'a Session, presenter: &'a mut P) -> Self {
        Self { session, presenter }
    }

    /// Queue `call` on the live session without waiting for its outcome.
    pub fn invoke(&mut self, call: ReducerCall) -> Result<()> {
        let handle = self.session.handle().ok_or(ClientError::NotConnected)?;
        let reducer = call.name();
        handle.call_reducer(call).map_err(|e| {
            warn!(reducer, error = %e, "reducer call not delivered");
            ClientError::from(e)
        })?;
        debug!(reducer, "reducer invoked");
        Ok(())
    }

    /// Handle one reducer completion notice.
    ///
    /// Returns `true` if it produced a visible error.
    pub fn on_result(&mut self, call: &ReducerCall, event: &ReducerEvent) -> bool {
        if !self.session.is_local(&event.caller_identity) {
            return false;
        }

        if event.status == ReducerStatus::Committed {
            debug!(reducer = call.name(), "reducer committed");
            return false;
        }

        let reason = event.message.as_deref().unwrap_or("no reason given");
        let line = match call {
            ReducerCall::SetName { name } => {
                format!("Failed to change name to {name}: {reason}")
            }
            ReducerCall::SendMessage { text } => {
                format!("Failed to send message \"{text}\": {reason}")
            }
        };
        error!(reducer = call.name(), "{line}");
        self.presenter.log(LogLevel::Error, line);
        true
    }
}
