//! # quickchat-store
//!
//! Client-side storage for quickchat.
//!
//! Two very different lifetimes live here.  The [`Mirror`] is the in-memory,
//! eventually-consistent copy of the subscribed relations and is rebuilt on
//! every connect.  The [`Database`] is a small SQLite file that outlives the
//! process and holds the session's auth token, exposed through the
//! [`TokenStore`] trait.

pub mod database;
pub mod migrations;
pub mod mirror;
pub mod storage;
pub mod table;
pub mod token;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use mirror::Mirror;
pub use table::{Table, TableRow};
pub use token::{MemoryTokenStore, TokenStore};
