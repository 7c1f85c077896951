//! The client's in-memory copy of the subscribed relations.

use quickchat_shared::{Identity, Message, User};

use crate::table::Table;

/// Local mirror of the `User` and `Message` relations.
///
/// `Message` rows are immutable, so the mirror offers no update for them.
#[derive(Debug, Default, Clone)]
pub struct Mirror {
    users: Table<User>,
    messages: Table<Message>,
}

impl Mirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the user row; returns the row it replaced.
    pub fn upsert_user(&mut self, user: User) -> Option<User> {
        self.users.insert(user)
    }

    /// Full replace of `old`'s row with `new`.
    pub fn update_user(&mut self, old: &User, new: User) -> Option<User> {
        self.users.update(&old.identity, new)
    }

    pub fn delete_user(&mut self, identity: &Identity) -> Option<User> {
        self.users.delete(identity)
    }

    pub fn user(&self, identity: &Identity) -> Option<&User> {
        self.users.get(identity)
    }

    /// Returns `false` when an identical row was already present.
    pub fn insert_message(&mut self, message: Message) -> bool {
        self.messages.insert(message).is_none()
    }

    pub fn delete_message(&mut self, message: &Message) -> bool {
        self.messages.delete(message).is_some()
    }

    pub fn users(&self) -> &Table<User> {
        &self.users
    }

    pub fn messages(&self) -> &Table<Message> {
        &self.messages
    }

    /// Messages sorted by `sent` ascending; equal timestamps keep arrival order.
    pub fn messages_by_sent(&self) -> Vec<&Message> {
        let mut sorted: Vec<&Message> = self.messages.iter().collect();
        sorted.sort_by_key(|m| m.sent);
        sorted
    }

    pub fn clear(&mut self) {
        self.users.clear();
        self.messages.clear();
    }
}
