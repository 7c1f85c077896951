//! # quickchat-client
//!
//! Client-side reconciliation core for quickchat: keeps a local mirror of the
//! `User` and `Message` relations in step with the remote service, renders it
//! through a [`Presenter`], correlates reducer results, and reconnects after
//! every disconnect.

pub mod client;
pub mod config;
pub mod connection;
pub mod correlator;
pub mod presenter;
pub mod reconciler;
pub mod session;
pub mod view;

mod error;

use tracing_subscriber::{fmt, EnvFilter};

pub use client::{ChatClient, Flow};
pub use config::ClientConfig;
pub use connection::{ClientCommand, ClientHandle, ConnectionManager};
pub use error::{ClientError, Result};
pub use presenter::{ConnectionStatus, LogLevel, Presenter, RenderedMessage};
pub use session::Session;
pub use view::{ChatView, SharedView};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `config.log_filter`.  Returns `false` if a subscriber
/// was already installed.
pub fn init_tracing(config: &ClientConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .is_ok()
}
