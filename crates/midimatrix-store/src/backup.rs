use midimatrix_shared::validation::{validate_badger, validate_matrix_name, validate_matrix_text};
use midimatrix_shared::UserId;
use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::error::Result;
use crate::models::{Matrix, Profile};
use crate::timestamps;
use crate::users::user_exists_in;

/// Full dump of the store, serialized to JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BackupPayload {
    /// RFC 3339 timestamp of when the backup was created
    pub created_at: String,
    /// Crate version that produced the backup
    pub version: String,
    pub users: Vec<UserId>,
    pub profiles: Vec<Profile>,
    pub matrices: Vec<Matrix>,
}

impl BackupPayload {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ImportStats {
    pub users_imported: usize,
    pub profiles_imported: usize,
    pub matrices_imported: usize,
    /// Records that failed validation or referenced a missing user.
    pub skipped: usize,
}

impl Database {
    /// Export users, profiles and matrices into a serializable struct.
    pub fn export_backup(&self) -> Result<BackupPayload> {
        Ok(BackupPayload {
            created_at: timestamps::encode(&timestamps::now()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            users: self.list_users()?,
            profiles: self.list_profiles()?,
            matrices: self.list_matrices()?,
        })
    }

    /// Import a backup payload, merging with existing data (INSERT OR IGNORE).
    /// Existing records are left untouched; a profile for a user that already
    /// has a different one is counted as skipped.
    pub fn import_backup(&self, payload: &BackupPayload) -> Result<ImportStats> {
        let mut stats = ImportStats::default();
        let tx = self.transaction()?;

        for user in &payload.users {
            stats.users_imported +=
                tx.execute("INSERT OR IGNORE INTO users (id) VALUES (?1)", [user.0])?;
        }

        for p in &payload.profiles {
            if validate_badger(&p.badger).is_err() || !user_exists_in(&tx, p.user)? {
                tracing::warn!(profile_id = %p.id, user = %p.user, "skipping invalid profile");
                stats.skipped += 1;
                continue;
            }

            let slot: Option<String> = tx
                .query_row(
                    "SELECT id FROM profiles WHERE user_id = ?1",
                    [p.user.0],
                    |row| row.get(0),
                )
                .optional()?;
            if slot.is_some_and(|id| id != p.id.to_string()) {
                tracing::warn!(
                    profile_id = %p.id,
                    user = %p.user,
                    "skipping profile, user already has one"
                );
                stats.skipped += 1;
                continue;
            }

            stats.profiles_imported += tx.execute(
                "INSERT OR IGNORE INTO profiles (id, user_id, badger, about, interests)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![p.id.to_string(), p.user.0, p.badger, p.about, p.interests],
            )?;
        }

        for m in &payload.matrices {
            let valid = validate_matrix_name(&m.name).is_ok()
                && validate_matrix_text("description", &m.description).is_ok()
                && validate_matrix_text("matrix", &m.matrix).is_ok()
                && m.mtime >= m.ctime;
            if !valid || !user_exists_in(&tx, m.author)? {
                tracing::warn!(matrix_id = %m.id, author = %m.author, "skipping invalid matrix");
                stats.skipped += 1;
                continue;
            }

            stats.matrices_imported += tx.execute(
                "INSERT OR IGNORE INTO matrices (id, author_id, ctime, mtime, name, description, matrix)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    m.id.to_string(),
                    m.author.0,
                    timestamps::encode(&m.ctime),
                    timestamps::encode(&m.mtime),
                    m.name,
                    m.description,
                    m.matrix,
                ],
            )?;
        }

        tx.commit()?;

        tracing::info!(
            users = stats.users_imported,
            profiles = stats.profiles_imported,
            matrices = stats.matrices_imported,
            skipped = stats.skipped,
            "imported backup"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewMatrix, NewProfile};
    use crate::test_support::{open, open_with_users};

    fn populated() -> Database {
        let db = open_with_users(&[1, 2]);
        db.create_profile(&NewProfile {
            badger: "loop maker".into(),
            ..NewProfile::for_user(UserId(1))
        })
        .unwrap();
        db.create_matrix(&NewMatrix {
            author: UserId(2),
            name: "Drone Patch".into(),
            description: "ambient pad".into(),
            matrix: "<opaque-blob>".into(),
        })
        .unwrap();
        db
    }

    #[test]
    fn export_then_import_into_empty_store() {
        let source = populated();
        let json = source.export_backup().unwrap().to_json().unwrap();

        let target = open();
        let stats = target
            .import_backup(&BackupPayload::from_json(&json).unwrap())
            .unwrap();

        assert_eq!(
            stats,
            ImportStats {
                users_imported: 2,
                profiles_imported: 1,
                matrices_imported: 1,
                skipped: 0,
            }
        );
        assert_eq!(target.list_profiles().unwrap(), source.list_profiles().unwrap());
        assert_eq!(target.list_matrices().unwrap(), source.list_matrices().unwrap());
    }

    #[test]
    fn reimport_is_a_no_op() {
        let db = populated();
        let payload = db.export_backup().unwrap();
        let stats = db.import_backup(&payload).unwrap();
        assert_eq!(stats, ImportStats::default());
    }

    #[test]
    fn invalid_records_are_skipped() {
        let source = populated();
        let mut payload = source.export_backup().unwrap();
        payload.users.retain(|u| *u != UserId(2));
        payload.profiles[0].badger = "z".repeat(31);

        let stats = open().import_backup(&payload).unwrap();
        assert_eq!(stats.users_imported, 1);
        assert_eq!(stats.profiles_imported, 0);
        assert_eq!(stats.matrices_imported, 0);
        assert_eq!(stats.skipped, 2);
    }

    #[test]
    fn profile_for_taken_user_is_skipped() {
        let source = populated();
        let payload = source.export_backup().unwrap();

        let target = open_with_users(&[1]);
        let existing = target
            .create_profile(&NewProfile {
                badger: "already here".into(),
                ..NewProfile::for_user(UserId(1))
            })
            .unwrap();

        let stats = target.import_backup(&payload).unwrap();
        assert_eq!(stats.profiles_imported, 0);
        assert_eq!(stats.skipped, 1);
        assert_eq!(target.get_profile_for_user(UserId(1)).unwrap(), existing);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(BackupPayload::from_json("{\"users\": 3}").is_err());
    }
}
