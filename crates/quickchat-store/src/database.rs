//! The client's durable SQLite file.
//!
//! Only the auth token lives here today, so the file is tiny and opened once
//! per client.  Every handle returned by this module has its schema migrated.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use rusqlite::Connection;

use crate::error::{Result, StoreError};
use crate::migrations;

const DB_FILE_NAME: &str = "quickchat.db";

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the token database at `location`, or at [`Database::default_path`]
    /// when none is given.  Missing parent directories are created.
    pub fn open(location: Option<&Path>) -> Result<Self> {
        match location {
            Some(path) => Self::open_at(path),
            None => Self::open_at(&Self::default_path()?),
        }
    }

    /// `<platform data dir>/quickchat.db`, e.g.
    /// `~/.local/share/quickchat/quickchat.db` on Linux.
    pub fn default_path() -> Result<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "quickchat", "quickchat").ok_or(StoreError::NoDataDir)?;
        Ok(dirs.data_dir().join(DB_FILE_NAME))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        tracing::debug!(path = %path.display(), "opening token database");

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::migrated(conn)
    }

    /// A throwaway database; the token is lost when the handle drops.
    pub fn open_in_memory() -> Result<Self> {
        Self::migrated(Connection::open_in_memory()?)
    }

    fn migrated(mut conn: Connection) -> Result<Self> {
        migrations::run_migrations(&mut conn)?;
        Ok(Self { conn })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn schema_version(&self) -> Result<u32> {
        migrations::schema_version(&self.conn)
    }

    /// `None` for in-memory databases.
    pub fn path(&self) -> Option<PathBuf> {
        self.conn
            .path()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_missing_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("client").join("tokens.db");

        let db = Database::open(Some(&path)).unwrap();
        assert!(path.exists());
        assert!(db.path().is_some());
    }

    #[test]
    fn reopen_keeps_schema_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens.db");

        drop(Database::open_at(&path).unwrap());
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.schema_version().unwrap(), migrations::CURRENT_VERSION);
    }

    #[test]
    fn in_memory_has_no_path() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.path(), None);
        assert_eq!(db.schema_version().unwrap(), migrations::CURRENT_VERSION);
    }
}
