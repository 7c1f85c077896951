//! The single explicit session value.
//!
//! A [`Session`] is created empty, populated when a connect succeeds and
//! cleared when the connection drops.  Only the auth token survives a clear.

use quickchat_net::SessionHandle;
use quickchat_shared::{Identity, User};
use quickchat_store::Mirror;

#[derive(Debug, Default)]
pub struct Session {
    /// Persisted across disconnects and restarts; `None` on first run.
    token: Option<String>,
    /// Assigned by the service; `None` until connect completes.
    local_identity: Option<Identity>,
    /// Outbound half of the live connection.
    handle: Option<SessionHandle>,
}

impl Session {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token,
            local_identity: None,
            handle: None,
        }
    }

    pub fn establish(&mut self, handle: SessionHandle, identity: Identity, token: String) {
        self.handle = Some(handle);
        self.local_identity = Some(identity);
        self.token = Some(token);
    }

    /// Forget everything but the token.
    pub fn clear(&mut self) {
        self.handle = None;
        self.local_identity = None;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn local_identity(&self) -> Option<Identity> {
        self.local_identity
    }

    pub fn handle(&self) -> Option<&SessionHandle> {
        self.handle.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    /// True only while connected and `identity` is ours.
    pub fn is_local(&self, identity: &Identity) -> bool {
        self.local_identity.as_ref() == Some(identity)
    }

    /// The mirrored `User` row for this session, if any.
    pub fn current_user<'m>(&self, mirror: &'m Mirror) -> Option<&'m User> {
        self.local_identity.as_ref().and_then(|id| mirror.user(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_keeps_token() {
        let (handle, _rx) = SessionHandle::channel();
        let identity = Identity::from_bytes([4; 32]);
        let mut session = Session::new(None);

        session.establish(handle, identity, "T".into());
        assert!(session.is_connected());
        assert!(session.is_local(&identity));

        session.clear();
        assert!(!session.is_connected());
        assert!(!session.is_local(&identity));
        assert_eq!(session.local_identity(), None);
        assert_eq!(session.token(), Some("T"));
    }

    #[test]
    fn test_current_user_derived_from_mirror() {
        let (handle, _rx) = SessionHandle::channel();
        let identity = Identity::from_bytes([4; 32]);
        let mut session = Session::new(None);
        let mut mirror = Mirror::new();

        assert!(session.current_user(&mirror).is_none());

        session.establish(handle, identity, "T".into());
        assert!(session.current_user(&mirror).is_none());

        mirror.upsert_user(User {
            identity,
            name: Some("me".into()),
            online: true,
        });
        assert_eq!(
            session.current_user(&mirror).and_then(|u| u.name.as_deref()),
            Some("me")
        );
    }
}
