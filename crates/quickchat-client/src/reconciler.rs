//! Applies subscription snapshots and live row events to the local mirror
//! and turns them into view updates.
//!
//! Snapshot rows are rendered once, in bulk, when the subscription is applied.
//! Message inserts tagged [`RowOrigin::Snapshot`] are therefore stored but not
//! drawn; only live inserts are appended incrementally, in arrival order.

use tracing::{debug, info};

use quickchat_shared::{Identity, Message, RowOrigin, User};
use quickchat_store::Mirror;

use crate::presenter::{LogLevel, Presenter, RenderedMessage};
use crate::session::Session;

/// Borrowed view of the state a row event may touch.
pub struct Reconciler<'a, P: Presenter> {
    pub session: &'a Session,
    pub mirror: &'a mut Mirror,
    pub presenter: &'a mut P,
}

impl<'a, P: Presenter> Reconciler<'a, P> {
    pub fn new(session: &'a Session, mirror: &'a mut Mirror, presenter: &'a mut P) -> Self {
        Self {
            session,
            mirror,
            presenter,
        }
    }

    pub fn user_inserted(&mut self, row: User, origin: RowOrigin) {
        debug!(identity = %row.identity.short(), ?origin, online = row.online, "user inserted");

        if row.online {
            self.log(format!("{} is online", row.display_name()));
        }

        let identity = row.identity;
        self.mirror.upsert_user(row);
        self.refresh_local_user(&identity);
    }

    pub fn user_updated(&mut self, old: User, new: User) {
        debug!(identity = %new.identity.short(), "user updated");

        if old.name != new.name {
            self.log(format!(
                "{} renamed to {}",
                old.display_name(),
                new.display_name()
            ));
        }

        if old.online != new.online {
            let verb = if new.online { "connected" } else { "disconnected" };
            self.log(format!("{} {}.", new.display_name(), verb));
        }

        let identity = new.identity;
        self.mirror.update_user(&old, new);
        self.refresh_local_user(&identity);
    }

    pub fn user_deleted(&mut self, row: User) {
        debug!(identity = %row.identity.short(), "user deleted");
        self.mirror.delete_user(&row.identity);
        if self.session.is_local(&row.identity) {
            self.presenter.set_username_field("");
        }
    }

    pub fn message_inserted(&mut self, row: Message, origin: RowOrigin) {
        let is_new = self.mirror.insert_message(row.clone());
        if !is_new {
            debug!(sent = %row.sent, "duplicate message row ignored");
            return;
        }

        // The snapshot is drawn in one pass by `subscription_applied`.
        if origin == RowOrigin::Snapshot {
            return;
        }

        let rendered = RenderedMessage::from_message(&row, &*self.mirror, self.session);
        self.presenter.render_message(rendered);
        self.presenter.scroll_to_bottom();
    }

    /// Messages are immutable and never retracted from the rendered list.
    pub fn message_deleted(&mut self, row: Message) {
        if !self.mirror.delete_message(&row) {
            debug!(sent = %row.sent, "delete for unknown message row");
        }
    }

    /// Rebuild the message list from the mirror and re-resolve the local user.
    pub fn subscription_applied(&mut self) {
        let ordered = self.mirror.messages_by_sent();
        info!(
            users = self.mirror.users().len(),
            messages = ordered.len(),
            "subscription applied"
        );

        self.presenter.clear_messages();
        for message in ordered {
            let rendered = RenderedMessage::from_message(message, &*self.mirror, self.session);
            self.presenter.render_message(rendered);
        }
        self.presenter.scroll_to_bottom();

        if let Some(user) = self.session.current_user(&*self.mirror) {
            let name = user.name.clone().unwrap_or_default();
            self.presenter.set_username_field(&name);
        }
    }

    fn refresh_local_user(&mut self, identity: &Identity) {
        if !self.session.is_local(identity) {
            return;
        }
        if let Some(user) = self.mirror.user(identity) {
            let name = user.name.clone().unwrap_or_default();
            self.presenter.set_username_field(&name);
        }
    }

    fn log(&mut self, line: String) {
        info!("{line}");
        self.presenter.log(LogLevel::Info, line);
    }
}
