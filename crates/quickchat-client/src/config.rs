//! Client configuration loaded from environment variables.
//!
//! Every setting has a default, so a client starts with zero configuration
//! against a local service.

use std::path::PathBuf;
use std::time::Duration;

use quickchat_shared::constants::{DEFAULT_HOST, DEFAULT_MODULE_NAME, RECONNECT_DELAY};
use quickchat_store::Database;

use crate::error::Result;

/// Default tracing filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str =
    "quickchat_client=debug,quickchat_net=debug,quickchat_store=info,warn";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Address of the realtime database service.
    /// Env: `QUICKCHAT_URI`
    /// Default: `http://localhost:3000`
    pub uri: String,

    /// Remote module to attach to.
    /// Env: `QUICKCHAT_MODULE`
    /// Default: `quickstart-chat`
    pub module_name: String,

    /// Wait between a disconnect and the reconnect it schedules.
    /// Env: `QUICKCHAT_RECONNECT_SECS`
    /// Default: 5 seconds
    pub reconnect_delay: Duration,

    /// Total reconnect attempts allowed over the client's lifetime.
    /// Env: `QUICKCHAT_RECONNECT_LIMIT`
    /// Default: `None` (always retry)
    pub reconnect_limit: Option<u32>,

    /// SQLite file holding the auth token.
    /// Env: `QUICKCHAT_DB_PATH`
    /// Default: `None` (platform data directory)
    pub db_path: Option<PathBuf>,

    /// Tracing filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_HOST.to_string(),
            module_name: DEFAULT_MODULE_NAME.to_string(),
            reconnect_delay: RECONNECT_DELAY,
            reconnect_limit: None,
            db_path: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(uri) = lookup("QUICKCHAT_URI") {
            config.uri = uri;
        }

        if let Some(module) = lookup("QUICKCHAT_MODULE") {
            config.module_name = module;
        }

        if let Some(val) = lookup("QUICKCHAT_RECONNECT_SECS") {
            match val.parse::<u64>() {
                Ok(secs) => config.reconnect_delay = Duration::from_secs(secs),
                Err(_) => {
                    tracing::warn!(value = %val, "Invalid QUICKCHAT_RECONNECT_SECS, using default")
                }
            }
        }

        if let Some(val) = lookup("QUICKCHAT_RECONNECT_LIMIT") {
            match val.parse::<u32>() {
                Ok(n) => config.reconnect_limit = Some(n),
                Err(_) => {
                    tracing::warn!(value = %val, "Invalid QUICKCHAT_RECONNECT_LIMIT, ignoring")
                }
            }
        }

        if let Some(path) = lookup("QUICKCHAT_DB_PATH") {
            if !path.is_empty() {
                config.db_path = Some(PathBuf::from(path));
            }
        }

        config
    }

    /// Open the durable token store this configuration points at.
    pub fn open_token_store(&self) -> Result<Database> {
        Ok(Database::open(self.db_path.as_deref())?)
    }
}
