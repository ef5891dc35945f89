//! The user-reference mirror.
//!
//! Users are owned by an external identity subsystem. The store only keeps
//! their ids so SQLite can enforce referential integrity for profiles and
//! matrices; the identity subsystem registers and removes them here.

use midimatrix_shared::UserId;
use rusqlite::{params, Connection};

use crate::config::DeletePolicy;
use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::UserDeletion;

/// Existence checks against whatever owns user identities.
pub trait UserDirectory {
    fn user_exists(&self, user: UserId) -> Result<bool>;
}

impl UserDirectory for Database {
    fn user_exists(&self, user: UserId) -> Result<bool> {
        user_exists_in(self.conn(), user)
    }
}

impl Database {
    /// Record a user id. Returns `true` if it was not known before.
    pub fn register_user(&self, user: UserId) -> Result<bool> {
        let inserted = self
            .conn()
            .execute("INSERT OR IGNORE INTO users (id) VALUES (?1)", params![user.0])?;
        if inserted > 0 {
            tracing::debug!(%user, "registered user");
        }
        Ok(inserted > 0)
    }

    pub fn user_exists(&self, user: UserId) -> Result<bool> {
        user_exists_in(self.conn(), user)
    }

    /// All known user ids, ascending.
    pub fn list_users(&self) -> Result<Vec<UserId>> {
        let mut stmt = self.conn().prepare("SELECT id FROM users ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| row.get(0).map(UserId))?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    /// Remove a user, applying the configured [`DeletePolicy`] to the
    /// records that reference it.
    pub fn delete_user(&self, user: UserId) -> Result<UserDeletion> {
        let tx = self.transaction()?;

        if !user_exists_in(&tx, user)? {
            return Err(StoreError::NotFound);
        }

        let outcome = match self.config().on_user_delete {
            DeletePolicy::Restrict => {
                let profiles = count(&tx, "SELECT COUNT(*) FROM profiles WHERE user_id = ?1", user)?;
                let matrices =
                    count(&tx, "SELECT COUNT(*) FROM matrices WHERE author_id = ?1", user)?;
                if profiles > 0 || matrices > 0 {
                    return Err(StoreError::UserHasDependents {
                        user,
                        profiles,
                        matrices,
                    });
                }
                UserDeletion::default()
            }
            DeletePolicy::Cascade => UserDeletion {
                profiles_removed: tx
                    .execute("DELETE FROM profiles WHERE user_id = ?1", params![user.0])?,
                matrices_removed: tx
                    .execute("DELETE FROM matrices WHERE author_id = ?1", params![user.0])?,
            },
        };

        tx.execute("DELETE FROM users WHERE id = ?1", params![user.0])?;
        tx.commit()?;

        tracing::info!(
            %user,
            profiles_removed = outcome.profiles_removed,
            matrices_removed = outcome.matrices_removed,
            "deleted user"
        );

        Ok(outcome)
    }
}

pub(crate) fn user_exists_in(conn: &Connection, user: UserId) -> Result<bool> {
    let found = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE id = ?1)",
        params![user.0],
        |row| row.get::<_, bool>(0),
    )?;
    Ok(found)
}

fn count(conn: &Connection, sql: &str, user: UserId) -> Result<usize> {
    let n: i64 = conn.query_row(sql, params![user.0], |row| row.get(0))?;
    Ok(n as usize)
}
