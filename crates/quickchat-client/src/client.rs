//! The reconciliation core behind a single dispatch point.
//!
//! [`ChatClient`] owns the [`Session`], the [`Mirror`], the token store and the
//! presenter.  Every inbound [`ClientEvent`] goes through
//! [`ChatClient::dispatch`], so a recorded event sequence replays
//! deterministically.

use tracing::{debug, error, info, warn};

use quickchat_net::{ConnectParams, SessionHandle};
use quickchat_shared::constants::{
    subscription_queries, DISCONNECTED_PLACEHOLDER, GAVE_UP_PLACEHOLDER,
};
use quickchat_shared::{ClientEvent, Identity, ReducerCall, User};
use quickchat_store::{Mirror, TokenStore};

use crate::config::ClientConfig;
use crate::correlator::Correlator;
use crate::error::{ClientError, Result};
use crate::presenter::{ConnectionStatus, LogLevel, Presenter};
use crate::reconciler::Reconciler;
use crate::session::Session;

/// What the connection task should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// The session is gone; schedule a reconnect.
    Disconnected,
}

pub struct ChatClient<S: TokenStore, P: Presenter> {
    session: Session,
    mirror: Mirror,
    tokens: S,
    presenter: P,
}

impl<S: TokenStore, P: Presenter> ChatClient<S, P> {
    /// Create a disconnected client, seeding the session with any persisted
    /// token.  A token that cannot be read is treated as absent.
    pub fn new(tokens: S, presenter: P) -> Self {
        let token = match tokens.load_token() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read stored token, connecting anonymously");
                None
            }
        };
        Self {
            session: Session::new(token),
            mirror: Mirror::new(),
            tokens,
            presenter,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn mirror(&self) -> &Mirror {
        &self.mirror
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    pub fn tokens(&self) -> &S {
        &self.tokens
    }

    pub fn current_user(&self) -> Option<&User> {
        self.session.current_user(&self.mirror)
    }

    pub fn connect_params(&self, config: &ClientConfig) -> ConnectParams {
        ConnectParams {
            uri: config.uri.clone(),
            module_name: config.module_name.clone(),
            token: self.session.token().map(String::from),
        }
    }

    pub fn set_status(&mut self, status: ConnectionStatus) {
        self.presenter.set_status(status);
    }

    /// Adopt a freshly established session and subscribe.
    ///
    /// The caller must already own the session's event receiver, so nothing
    /// the subscription produces can be missed.
    pub fn on_connected(
        &mut self,
        handle: SessionHandle,
        identity: Identity,
        token: String,
    ) -> Result<()> {
        info!(identity = %identity.short(), "Connected");

        if let Err(e) = self.tokens.save_token(&token) {
            warn!(error = %e, "Failed to persist auth token");
        }

        self.mirror.clear();
        self.session.establish(handle, identity, token);
        self.presenter.set_status(ConnectionStatus::Connected);
        self.presenter.log(LogLevel::Info, "Connected!".to_string());

        let handle = self.session.handle().ok_or(ClientError::NotConnected)?;
        handle.subscribe(subscription_queries())?;
        debug!("subscription requested");
        Ok(())
    }

    /// Report a failed connect. No retry is scheduled.
    pub fn on_connect_error(&mut self, err: &ClientError) {
        error!(error = %err, "Connection error");
        self.session.clear();
        self.presenter.set_status(ConnectionStatus::Error {
            message: err.to_string(),
        });
        self.presenter
            .log(LogLevel::Error, format!("Connection error: {err}"));
    }

    /// Apply one inbound event.
    pub fn dispatch(&mut self, event: ClientEvent) -> Flow {
        debug!(kind = event.kind(), "dispatching event");

        match event {
            ClientEvent::UserInserted { row, origin } => {
                self.reconciler().user_inserted(row, origin);
            }
            ClientEvent::UserUpdated { old, new } => {
                self.reconciler().user_updated(old, new);
            }
            ClientEvent::UserDeleted { row } => {
                self.reconciler().user_deleted(row);
            }
            ClientEvent::MessageInserted { row, origin } => {
                self.reconciler().message_inserted(row, origin);
            }
            ClientEvent::MessageDeleted { row } => {
                self.reconciler().message_deleted(row);
            }
            ClientEvent::SubscriptionApplied => {
                self.reconciler().subscription_applied();
            }
            ClientEvent::ReducerResult { call, event } => {
                Correlator::new(&self.session, &mut self.presenter).on_result(&call, &event);
            }
            ClientEvent::Disconnected { reason } => {
                self.on_disconnected(&reason);
                return Flow::Disconnected;
            }
        }
        Flow::Continue
    }

    /// Send the message box contents.
    ///
    /// The input is cleared as soon as the call is queued, before the service
    /// acknowledges it.
    pub fn send_message(&mut self, input: &str) -> Result<()> {
        if !self.session.is_connected() {
            return Err(ClientError::NotConnected);
        }
        let text = input.trim();
        if text.is_empty() {
            return Err(ClientError::EmptyInput("Message"));
        }

        Correlator::new(&self.session, &mut self.presenter).invoke(ReducerCall::SendMessage {
            text: text.to_string(),
        })?;
        self.presenter.clear_message_input();
        Ok(())
    }

    /// Ask the service to rename the local user. The username field is left as
    /// typed; the resulting row update rewrites it.
    pub fn set_name(&mut self, input: &str) -> Result<()> {
        if !self.session.is_connected() {
            return Err(ClientError::NotConnected);
        }
        let name = input.trim();
        if name.is_empty() {
            return Err(ClientError::EmptyInput("Name"));
        }

        Correlator::new(&self.session, &mut self.presenter).invoke(ReducerCall::SetName {
            name: name.to_string(),
        })
    }

    /// Close the live session from this side, if any.
    pub fn disconnect(&mut self) {
        if let Some(handle) = self.session.handle() {
            if handle.disconnect().is_err() {
                debug!("session already closed");
            }
        }
    }

    /// Tell the user no further reconnect will be attempted.
    pub fn on_reconnect_exhausted(&mut self, limit: u32) {
        warn!(limit, "Reconnect limit reached, staying disconnected");
        self.presenter.show_placeholder(GAVE_UP_PLACEHOLDER);
        self.presenter.set_status(ConnectionStatus::Disconnected);
        self.presenter.log(
            LogLevel::Error,
            format!("Reconnect limit ({limit}) reached, staying disconnected"),
        );
    }

    fn on_disconnected(&mut self, reason: &str) {
        info!(reason, "Disconnected");
        self.session.clear();
        self.mirror.clear();
        self.presenter.show_placeholder(DISCONNECTED_PLACEHOLDER);
        self.presenter.set_status(ConnectionStatus::Disconnected);
        self.presenter
            .log(LogLevel::Info, format!("Disconnected: {reason}"));
    }

    fn reconciler(&mut self) -> Reconciler<'_, P> {
        Reconciler::new(&self.session, &mut self.mirror, &mut self.presenter)
    }
}
