//! Connection lifecycle task.
//!
//! The [`ConnectionManager`] runs in a single tokio task that exclusively owns
//! the [`ChatClient`].  Remote events and user actions reach it through
//! channels and are applied one at a time, so the client needs no locking.
//!
//! ```text
//!   ClientHandle          mpsc        ConnectionManager task
//!   .send_message()  ──────────────▶  ChatClient (session, mirror, view)
//!   .set_name()                       ▲
//!                     Transport ──────┘ ClientEvent stream
//! ```
//!
//! A failed connect is reported and not retried.  A disconnect always
//! schedules exactly one reconnect after `reconnect_delay`, using the
//! persisted token; that includes a session that closes between a successful
//! connect and its subscription.

use std::future::pending;
use std::pin::Pin;

use tokio::sync::mpsc;
use tokio::time::{sleep, Sleep};
use tracing::{debug, info, warn};

use quickchat_net::{NetError, Transport};
use quickchat_shared::ClientEvent;
use quickchat_store::TokenStore;

use crate::client::{ChatClient, Flow};
use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::presenter::{ConnectionStatus, Presenter};

/// User actions forwarded into the connection task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    SendMessage(String),
    SetName(String),
    /// Close the session and stop the task.
    Shutdown,
}

/// Cloneable sender for [`ClientCommand`]s.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    tx: mpsc::UnboundedSender<ClientCommand>,
}

impl ClientHandle {
    pub fn send_message(&self, text: impl Into<String>) -> bool {
        self.tx.send(ClientCommand::SendMessage(text.into())).is_ok()
    }

    pub fn set_name(&self, name: impl Into<String>) -> bool {
        self.tx.send(ClientCommand::SetName(name.into())).is_ok()
    }

    pub fn shutdown(&self) -> bool {
        self.tx.send(ClientCommand::Shutdown).is_ok()
    }
}

pub struct ConnectionManager<T, S, P>
where
    T: Transport,
    S: TokenStore,
    P: Presenter,
{
    config: ClientConfig,
    transport: T,
    client: ChatClient<S, P>,
    commands: mpsc::UnboundedReceiver<ClientCommand>,
    events: Option<mpsc::UnboundedReceiver<ClientEvent>>,
    reconnect_timer: Option<Pin<Box<Sleep>>>,
    reconnects: u32,
}

impl<T, S, P> ConnectionManager<T, S, P>
where
    T: Transport,
    S: TokenStore,
    P: Presenter,
{
    pub fn new(
        config: ClientConfig,
        transport: T,
        client: ChatClient<S, P>,
    ) -> (Self, ClientHandle) {
        let (tx, commands) = mpsc::unbounded_channel();
        let manager = Self {
            config,
            transport,
            client,
            commands,
            events: None,
            reconnect_timer: None,
            reconnects: 0,
        };
        (manager, ClientHandle { tx })
    }

    /// Spawn [`ConnectionManager::run`] on the current runtime.
    pub fn spawn(self) -> tokio::task::JoinHandle<ChatClient<S, P>>
    where
        S: 'static,
        P: 'static,
    {
        tokio::spawn(self.run())
    }

    /// Connect, then process events and commands until shutdown.
    ///
    /// Returns the client so its final state can be inspected.
    pub async fn run(mut self) -> ChatClient<S, P> {
        self.connect().await;

        loop {
            tokio::select! {
                cmd = self.commands.recv() => {
                    match cmd {
                        Some(ClientCommand::SendMessage(text)) => {
                            if let Err(e) = self.client.send_message(&text) {
                                debug!(error = %e, "send_message rejected");
                            }
                        }
                        Some(ClientCommand::SetName(name)) => {
                            if let Err(e) = self.client.set_name(&name) {
                                debug!(error = %e, "set_name rejected");
                            }
                        }
                        Some(ClientCommand::Shutdown) | None => break,
                    }
                }
                event = next_event(&mut self.events) => {
                    let event = event.unwrap_or_else(|| ClientEvent::Disconnected {
                        reason: "event stream closed".to_string(),
                    });
                    if self.client.dispatch(event) == Flow::Disconnected {
                        self.events = None;
                        self.schedule_reconnect();
                    }
                }
                () = expired(&mut self.reconnect_timer) => {
                    self.reconnect_timer = None;
                    self.connect().await;
                }
            }
        }

        info!("Connection manager shutting down");
        self.client.disconnect();
        self.client
    }

    async fn connect(&mut self) {
        let params = self.client.connect_params(&self.config);
        info!(
            uri = %params.uri,
            module = %params.module_name,
            has_token = params.token.is_some(),
            "Attempting to connect..."
        );
        self.client.set_status(ConnectionStatus::Connecting);

        match self.transport.connect(&params).await {
            Ok(connected) => {
                // Own the event stream before subscribing.
                self.events = Some(connected.events);
                self.reconnect_timer = None;
                let outcome =
                    self.client
                        .on_connected(connected.handle, connected.identity, connected.token);
                match outcome {
                    Ok(()) => {}
                    // Connected, then lost before the subscription went out.
                    Err(ClientError::Net(NetError::SessionClosed)) => {
                        warn!("Session closed before subscribing");
                        self.events = None;
                        self.client.dispatch(ClientEvent::Disconnected {
                            reason: "session closed before subscribing".to_string(),
                        });
                        self.schedule_reconnect();
                    }
                    Err(e) => {
                        self.events = None;
                        self.client.on_connect_error(&e);
                    }
                }
            }
            Err(e) => {
                self.events = None;
                self.client.on_connect_error(&ClientError::from(e));
            }
        }
    }

    fn schedule_reconnect(&mut self) {
        if let Some(limit) = self.config.reconnect_limit {
            if self.reconnects >= limit {
                self.client.on_reconnect_exhausted(limit);
                return;
            }
        }
        self.reconnects += 1;

        let delay = self.config.reconnect_delay;
        info!(
            attempt = self.reconnects,
            delay_secs = delay.as_secs_f64(),
            "Scheduling reconnect"
        );
        self.client.set_status(ConnectionStatus::Reconnecting {
            attempt: self.reconnects,
        });
        self.reconnect_timer = Some(Box::pin(sleep(delay)));
    }
}

/// Next event from the live session; pending forever while disconnected.
async fn next_event(
    events: &mut Option<mpsc::UnboundedReceiver<ClientEvent>>,
) -> Option<ClientEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => pending().await,
    }
}

/// Completes when the reconnect timer fires; pending forever when none is set.
async fn expired(timer: &mut Option<Pin<Box<Sleep>>>) {
    match timer {
        Some(deadline) => deadline.as_mut().await,
        None => pending().await,
    }
}
