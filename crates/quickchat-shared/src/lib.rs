//! # quickchat-shared
//!
//! Types shared by every quickchat crate: principal identities, the rows of
//! the two subscribed relations, reducer calls and the tagged event stream
//! that the remote service pushes to the client.

pub mod constants;
pub mod error;
pub mod identity;
pub mod protocol;
pub mod types;

pub use error::SharedError;
pub use identity::Identity;
pub use protocol::{ClientEvent, ReducerCall, ReducerEvent, ReducerStatus, RowOrigin};
pub use types::{Message, Timestamp, User};
