//! Presentation boundary: what the reconciliation core asks the UI to do.

use serde::Serialize;

use quickchat_shared::constants::UNKNOWN_SENDER;
use quickchat_shared::{Message, Timestamp};
use quickchat_store::Mirror;

use crate::session::Session;

/// Connection lifecycle status shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
    Error { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Error,
}

/// One entry of the message list, ready to draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedMessage {
    pub sender_name: String,
    pub text: String,
    pub sent: Timestamp,
    /// Drawn as `self` rather than `other`
    pub is_self: bool,
}

impl RenderedMessage {
    /// Resolve `message` against the mirror and session.
    ///
    /// Senders missing from the mirror render as `unknown`.
    pub fn from_message(message: &Message, mirror: &Mirror, session: &Session) -> Self {
        let sender_name = mirror
            .user(&message.sender)
            .map(|u| u.display_name())
            .unwrap_or_else(|| UNKNOWN_SENDER.to_string());
        Self {
            sender_name,
            text: message.text.clone(),
            sent: message.sent,
            is_self: session.is_local(&message.sender),
        }
    }
}

/// View mutations requested by the client.
///
/// Implementations hold only rendered copies; the [`Mirror`] stays the
/// authoritative store.
pub trait Presenter: Send {
    /// Empty the message list, dropping any placeholder.
    fn clear_messages(&mut self);

    /// Append one message to the end of the list.
    fn render_message(&mut self, message: RenderedMessage);

    /// Replace the message list with a single placeholder line.
    fn show_placeholder(&mut self, text: &str);

    fn scroll_to_bottom(&mut self);

    fn set_username_field(&mut self, value: &str);

    fn clear_message_input(&mut self);

    fn log(&mut self, level: LogLevel, line: String);

    fn set_status(&mut self, status: ConnectionStatus);
}
