//! Durable storage of the session auth token.
//!
//! The token is the only piece of session state that survives a disconnect
//! or a process restart.

use std::sync::{Arc, Mutex};

use quickchat_shared::constants::TOKEN_STORAGE_KEY;

use crate::database::Database;
use crate::error::{Result, StoreError};

/// Read/write access to the persisted auth token.
pub trait TokenStore: Send {
    /// `None` on first run.
    fn load_token(&self) -> Result<Option<String>>;

    /// Persist `token`, replacing any prior value.
    fn save_token(&mut self, token: &str) -> Result<()>;
}

impl TokenStore for Database {
    fn load_token(&self) -> Result<Option<String>> {
        self.get_item(TOKEN_STORAGE_KEY)
    }

    fn save_token(&mut self, token: &str) -> Result<()> {
        self.set_item(TOKEN_STORAGE_KEY, token)?;
        tracing::debug!("auth token persisted");
        Ok(())
    }
}

/// Process-local token store.
///
/// Clones share the same slot, so a test can hand one clone to the client and
/// keep another to inspect what was written.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(token.into()))),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load_token(&self) -> Result<Option<String>> {
        let guard = self.slot.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.clone())
    }

    fn save_token(&mut self, token: &str) -> Result<()> {
        let mut guard = self.slot.lock().map_err(|_| StoreError::Poisoned)?;
        *guard = Some(token.to_string());
        Ok(())
    }
}
