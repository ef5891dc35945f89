//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees that
//! migrations are run before any other operation. It is the explicit
//! persistence handle every CRUD helper hangs off; each helper opens its own
//! transaction so a single operation is atomic.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use midimatrix_shared::constants::DB_FILE_NAME;
use rusqlite::{Connection, Transaction};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::migrations;

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Connection,
    config: StoreConfig,
}

impl Database {
    /// Open (or create) the database described by `config`.
    ///
    /// Without an explicit `database_path` the file is placed in the
    /// platform-appropriate data directory:
    /// - Linux:   `~/.local/share/midimatrix/midimatrix.db`
    /// - macOS:   `~/Library/Application Support/org.midimatrix.midimatrix/midimatrix.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\midimatrix\midimatrix\data\midimatrix.db`
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let db_path = match &config.database_path {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                path.clone()
            }
            None => {
                let project_dirs = ProjectDirs::from("org", "midimatrix", "midimatrix")
                    .ok_or(StoreError::NoDataDir)?;
                let data_dir = project_dirs.data_dir();
                std::fs::create_dir_all(data_dir)?;
                data_dir.join(DB_FILE_NAME)
            }
        };

        tracing::info!(path = %db_path.display(), "opening database");

        Self::open_at(&db_path, config)
    }

    /// Open (or create) a database at an explicit path.
    pub fn open_at(path: &Path, config: &StoreConfig) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::init(conn, config)
    }

    /// Open a private in-memory database. Mostly useful for tests.
    pub fn open_in_memory(config: &StoreConfig) -> Result<Self> {
        Self::init(Connection::open_in_memory()?, config)
    }

    fn init(conn: Connection, config: &StoreConfig) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(config.busy_timeout)?;

        migrations::run_migrations(&conn)?;

        tracing::debug!(on_user_delete = %config.on_user_delete, "database ready");

        Ok(Self {
            conn,
            config: config.clone(),
        })
    }

    /// Return a reference to the underlying `rusqlite::Connection`.
    ///
    /// Callers should prefer the typed CRUD helpers, but direct access is
    /// occasionally needed for ad-hoc queries.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// The configuration this handle was opened with.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn
            .path()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }

    /// Begin a transaction scoped to one store operation. Dropping it without
    /// calling `commit` rolls back.
    pub(crate) fn transaction(&self) -> Result<Transaction<'_>> {
        Ok(self.conn.unchecked_transaction()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");

        let db = Database::open_at(&path, &StoreConfig::default()).expect("should open");
        assert!(db.path().is_some());
    }

    #[test]
    fn new_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("data").join("mm.db");
        let config = StoreConfig {
            database_path: Some(path.clone()),
            ..StoreConfig::default()
        };

        Database::new(&config).expect("should open");
        assert!(path.exists());
    }

    #[test]
    fn reopen_keeps_data_and_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");
        let config = StoreConfig::default();

        {
            let db = Database::open_at(&path, &config).unwrap();
            db.register_user(midimatrix_shared::UserId(1)).unwrap();
        }

        let db = Database::open_at(&path, &config).unwrap();
        assert!(db.user_exists(midimatrix_shared::UserId(1)).unwrap());
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let db = Database::open_in_memory(&StoreConfig::default()).unwrap();
        let enabled: i64 = db
            .conn()
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }
}
