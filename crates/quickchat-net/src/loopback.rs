//! In-process stand-in for the remote chat module.
//!
//! [`LoopbackService`] implements [`Transport`] without any network: it keeps
//! the `User` and `Message` relations in memory, runs the `SetName` and
//! `SendMessage` reducers, and pushes the resulting events to every
//! subscribed session in the order it applied them.  Integration tests and
//! local demos drive the client against it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use indexmap::IndexMap;
use rand::RngCore;
use tokio::sync::mpsc;
use tracing::{debug, info};

use quickchat_shared::constants::{MESSAGE_QUERY, USER_QUERY};
use quickchat_shared::{
    ClientEvent, Identity, Message, ReducerCall, ReducerEvent, ReducerStatus, RowOrigin,
    Timestamp, User,
};

use crate::error::NetError;
use crate::session::{SessionCommand, SessionHandle};
use crate::transport::{ConnectParams, Connected, Transport};

type ClientId = u64;

struct ClientLink {
    identity: Identity,
    events: mpsc::UnboundedSender<ClientEvent>,
    subscribed: bool,
}

#[derive(Default)]
struct ModuleState {
    users: IndexMap<Identity, User>,
    messages: Vec<Message>,
    tokens: HashMap<String, Identity>,
    clients: HashMap<ClientId, ClientLink>,
    next_client_id: ClientId,
    refuse_reason: Option<String>,
    connect_attempts: Vec<Option<String>>,
    last_sent: i64,
}

impl ModuleState {
    fn broadcast(&mut self, event: ClientEvent) {
        for link in self.clients.values().filter(|l| l.subscribed) {
            let _ = link.events.send(event.clone());
        }
    }

    fn next_sent(&mut self) -> Timestamp {
        let now = Timestamp::now().as_micros();
        self.last_sent = now.max(self.last_sent + 1);
        Timestamp::from_micros(self.last_sent)
    }

    fn set_online(&mut self, identity: Identity, online: bool) {
        match self.users.get(&identity).cloned() {
            Some(old) if old.online != online => {
                let new = User { online, ..old.clone() };
                self.users.insert(identity, new.clone());
                self.broadcast(ClientEvent::UserUpdated { old, new });
            }
            Some(_) => {}
            None if online => {
                let row = User {
                    identity,
                    name: None,
                    online: true,
                };
                self.users.insert(identity, row.clone());
                self.broadcast(ClientEvent::UserInserted {
                    row,
                    origin: RowOrigin::Live,
                });
            }
            None => {}
        }
    }

    fn drop_client(&mut self, id: ClientId, reason: &str) {
        let Some(link) = self.clients.remove(&id) else {
            return;
        };
        let _ = link.events.send(ClientEvent::Disconnected {
            reason: reason.to_string(),
        });
        debug!(client = id, identity = %link.identity.short(), reason, "session closed");

        let still_connected = self.clients.values().any(|l| l.identity == link.identity);
        if !still_connected {
            self.set_online(link.identity, false);
        }
    }

    fn subscribe(&mut self, id: ClientId, queries: &[String]) {
        let wants_users = queries.iter().any(|q| q == USER_QUERY);
        let wants_messages = queries.iter().any(|q| q == MESSAGE_QUERY);

        let mut snapshot = Vec::new();
        if wants_users {
            snapshot.extend(self.users.values().map(|row| ClientEvent::UserInserted {
                row: row.clone(),
                origin: RowOrigin::Snapshot,
            }));
        }
        if wants_messages {
            snapshot.extend(self.messages.iter().map(|row| ClientEvent::MessageInserted {
                row: row.clone(),
                origin: RowOrigin::Snapshot,
            }));
        }
        snapshot.push(ClientEvent::SubscriptionApplied);

        if let Some(link) = self.clients.get_mut(&id) {
            for event in snapshot {
                let _ = link.events.send(event);
            }
            link.subscribed = true;
        }
    }

    fn call_reducer(&mut self, id: ClientId, call: ReducerCall) {
        let Some(caller) = self.clients.get(&id).map(|l| l.identity) else {
            return;
        };

        let outcome = match &call {
            ReducerCall::SetName { name } => self.set_name(caller, name),
            ReducerCall::SendMessage { text } => self.send_message(caller, text),
        };

        let event = match outcome {
            Ok(()) => ReducerEvent {
                caller_identity: caller,
                status: ReducerStatus::Committed,
                message: None,
            },
            Err(message) => {
                info!(reducer = call.name(), caller = %caller.short(), %message, "reducer failed");
                ReducerEvent {
                    caller_identity: caller,
                    status: ReducerStatus::Failed,
                    message: Some(message),
                }
            }
        };
        self.broadcast(ClientEvent::ReducerResult { call, event });
    }

    fn set_name(&mut self, caller: Identity, name: &str) -> Result<(), String> {
        if name.is_empty() {
            return Err("Names must not be empty".to_string());
        }
        let old = self
            .users
            .get(&caller)
            .cloned()
            .ok_or_else(|| "Cannot set name for unknown user".to_string())?;
        let new = User {
            name: Some(name.to_string()),
            ..old.clone()
        };
        self.users.insert(caller, new.clone());
        self.broadcast(ClientEvent::UserUpdated { old, new });
        Ok(())
    }

    fn send_message(&mut self, sender: Identity, text: &str) -> Result<(), String> {
        if text.is_empty() {
            return Err("Messages must not be empty".to_string());
        }
        let row = Message {
            sender,
            sent: self.next_sent(),
            text: text.to_string(),
        };
        self.messages.push(row.clone());
        self.broadcast(ClientEvent::MessageInserted {
            row,
            origin: RowOrigin::Live,
        });
        Ok(())
    }
}

/// In-memory chat module reachable through [`Transport`].
///
/// Clones share the same module state.
#[derive(Clone, Default)]
pub struct LoopbackService {
    state: Arc<Mutex<ModuleState>>,
}

impl LoopbackService {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ModuleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make subsequent connects fail with `reason`, or succeed again with `None`.
    pub fn refuse_connections(&self, reason: Option<&str>) {
        self.lock().refuse_reason = reason.map(String::from);
    }

    /// Token presented on every connect attempt so far, oldest first.
    pub fn connect_attempts(&self) -> Vec<Option<String>> {
        self.lock().connect_attempts.clone()
    }

    /// Drop every live session as if the network failed.
    pub fn disconnect_all(&self, reason: &str) {
        let mut state = self.lock();
        let ids: Vec<ClientId> = state.clients.keys().copied().collect();
        for id in ids {
            state.drop_client(id, reason);
        }
    }

    pub fn connected_clients(&self) -> usize {
        self.lock().clients.len()
    }

    /// Insert a message row directly, bypassing the reducer.
    pub fn seed_message(&self, row: Message) {
        let mut state = self.lock();
        state.last_sent = state.last_sent.max(row.sent.as_micros());
        state.messages.push(row.clone());
        state.broadcast(ClientEvent::MessageInserted {
            row,
            origin: RowOrigin::Live,
        });
    }

    /// Insert or replace a user row directly, bypassing the reducers.
    pub fn seed_user(&self, row: User) {
        let mut state = self.lock();
        let event = match state.users.insert(row.identity, row.clone()) {
            Some(old) => ClientEvent::UserUpdated { old, new: row },
            None => ClientEvent::UserInserted {
                row,
                origin: RowOrigin::Live,
            },
        };
        state.broadcast(event);
    }

    /// Push an arbitrary event to every subscribed session.
    pub fn broadcast(&self, event: ClientEvent) {
        self.lock().broadcast(event);
    }

    pub fn users(&self) -> Vec<User> {
        self.lock().users.values().cloned().collect()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.lock().messages.clone()
    }

    /// Identity previously issued for `token`.
    pub fn identity_for(&self, token: &str) -> Option<Identity> {
        self.lock().tokens.get(token).copied()
    }

    fn handle_command(&self, id: ClientId, cmd: SessionCommand) -> bool {
        let mut state = self.lock();
        match cmd {
            SessionCommand::Subscribe(queries) => {
                state.subscribe(id, &queries);
                true
            }
            SessionCommand::CallReducer(call) => {
                state.call_reducer(id, call);
                true
            }
            SessionCommand::Disconnect => {
                state.drop_client(id, "client closed the session");
                false
            }
        }
    }
}

#[async_trait]
impl Transport for LoopbackService {
    async fn connect(&mut self, params: &ConnectParams) -> Result<Connected, NetError> {
        let (id, identity, token, events_rx, cmd_rx, handle) = {
            let mut state = self.lock();
            state.connect_attempts.push(params.token.clone());

            if let Some(reason) = &state.refuse_reason {
                return Err(NetError::ConnectRefused(reason.clone()));
            }

            let (identity, token) = match &params.token {
                Some(token) => {
                    let identity = state
                        .tokens
                        .get(token)
                        .copied()
                        .ok_or_else(|| NetError::Unauthorized("unknown token".to_string()))?;
                    (identity, token.clone())
                }
                None => {
                    let identity = Identity::random();
                    let mut secret = [0u8; 16];
                    rand::thread_rng().fill_bytes(&mut secret);
                    let token = hex::encode(secret);
                    state.tokens.insert(token.clone(), identity);
                    (identity, token)
                }
            };

            let id = state.next_client_id;
            state.next_client_id += 1;

            let (events_tx, events_rx) = mpsc::unbounded_channel();
            let (handle, cmd_rx) = SessionHandle::channel();
            state.clients.insert(
                id,
                ClientLink {
                    identity,
                    events: events_tx,
                    subscribed: false,
                },
            );
            state.set_online(identity, true);

            (id, identity, token, events_rx, cmd_rx, handle)
        };

        info!(
            client = id,
            identity = %identity.short(),
            module = %params.module_name,
            "loopback session opened"
        );

        let service = self.clone();
        tokio::spawn(async move {
            let mut cmd_rx = cmd_rx;
            while let Some(cmd) = cmd_rx.recv().await {
                if !service.handle_command(id, cmd) {
                    return;
                }
            }
            service.lock().drop_client(id, "session handle dropped");
        });

        Ok(Connected {
            handle,
            identity,
            token,
            events: events_rx,
        })
    }
}
