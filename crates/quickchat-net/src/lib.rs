//! Remote session boundary.
//!
//! The realtime database's wire protocol lives behind [`Transport`].  A
//! successful connect yields a [`SessionHandle`] for outbound commands and an
//! ordered stream of [`ClientEvent`](quickchat_shared::ClientEvent)s for
//! everything the service pushes back.

pub mod error;
pub mod loopback;
pub mod session;
pub mod transport;

pub use error::NetError;
pub use loopback::LoopbackService;
pub use session::{SessionCommand, SessionHandle};
pub use transport::{ConnectParams, Connected, Transport};
