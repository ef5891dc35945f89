//! CRUD operations for [`Profile`] records.

use midimatrix_shared::validation::validate_badger;
use midimatrix_shared::{ProfileId, UserId};
use rusqlite::{ffi, params, Connection, OptionalExtension};
use uuid::Uuid;

use crate::database::Database;
use crate::error::{constraint_kind, not_found, Result, StoreError};
use crate::models::{NewProfile, Profile, ProfileUpdate};
use crate::users::user_exists_in;

const SELECT_PROFILE: &str = "SELECT id, user_id, badger, about, interests FROM profiles";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a profile for a user that does not have one yet.
    pub fn create_profile(&self, new: &NewProfile) -> Result<Profile> {
        validate_badger(&new.badger)?;

        let tx = self.transaction()?;
        let profile = insert_new(&tx, new)?;
        tx.commit()?;

        tracing::debug!(profile_id = %profile.id, user = %profile.user, "created profile");
        Ok(profile)
    }

    /// Fetch the user's profile, creating an empty one on first use.
    /// The flag is `true` when the profile was just created.
    pub fn get_or_create_profile(&self, user: UserId) -> Result<(Profile, bool)> {
        let tx = self.transaction()?;

        if let Some(existing) = fetch_for_user(&tx, user)? {
            return Ok((existing, false));
        }

        let profile = insert_new(&tx, &NewProfile::for_user(user))?;
        tx.commit()?;

        tracing::debug!(profile_id = %profile.id, %user, "created profile on demand");
        Ok((profile, true))
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_profile(&self, id: ProfileId) -> Result<Profile> {
        fetch(self.conn(), id)
    }

    pub fn get_profile_for_user(&self, user: UserId) -> Result<Profile> {
        fetch_for_user(self.conn(), user)?.ok_or(StoreError::NotFound)
    }

    /// List all profiles, ordered by user id.
    pub fn list_profiles(&self) -> Result<Vec<Profile>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("{SELECT_PROFILE} ORDER BY user_id ASC"))?;
        let rows = stmt.query_map([], row_to_profile)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StoreError::Sqlite)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Apply a partial update and return the stored result.
    pub fn update_profile(&self, id: ProfileId, update: &ProfileUpdate) -> Result<Profile> {
        if let Some(badger) = &update.badger {
            validate_badger(badger)?;
        }

        let tx = self.transaction()?;
        let mut profile = fetch(&tx, id)?;

        if let Some(badger) = &update.badger {
            profile.badger = badger.clone();
        }
        if let Some(about) = &update.about {
            profile.about = about.clone();
        }
        if let Some(interests) = &update.interests {
            profile.interests = interests.clone();
        }

        tx.execute(
            "UPDATE profiles SET badger = ?1, about = ?2, interests = ?3 WHERE id = ?4",
            params![profile.badger, profile.about, profile.interests, id.to_string()],
        )?;
        tx.commit()?;

        tracing::debug!(profile_id = %id, "updated profile");
        Ok(profile)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a profile by id. Returns `true` if a row was deleted.
    pub fn delete_profile(&self, id: ProfileId) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM profiles WHERE id = ?1", params![id.to_string()])?;
        if affected > 0 {
            tracing::debug!(profile_id = %id, "deleted profile");
        }
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn insert_new(conn: &Connection, new: &NewProfile) -> Result<Profile> {
    if !user_exists_in(conn, new.user)? {
        return Err(StoreError::UnknownUser(new.user));
    }
    if fetch_for_user(conn, new.user)?.is_some() {
        return Err(StoreError::DuplicateProfile(new.user));
    }

    let profile = Profile {
        id: ProfileId::new(),
        user: new.user,
        badger: new.badger.clone(),
        about: new.about.clone(),
        interests: new.interests.clone(),
    };
    insert(conn, &profile).map_err(|e| match constraint_kind(&e) {
        Some(ffi::SQLITE_CONSTRAINT_UNIQUE) => StoreError::DuplicateProfile(profile.user),
        Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => StoreError::UnknownUser(profile.user),
        _ => StoreError::Sqlite(e),
    })?;
    Ok(profile)
}

fn insert(conn: &Connection, profile: &Profile) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO profiles (id, user_id, badger, about, interests)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            profile.id.to_string(),
            profile.user.0,
            profile.badger,
            profile.about,
            profile.interests,
        ],
    )
}

fn fetch(conn: &Connection, id: ProfileId) -> Result<Profile> {
    conn.query_row(
        &format!("{SELECT_PROFILE} WHERE id = ?1"),
        params![id.to_string()],
        row_to_profile,
    )
    .map_err(not_found)
}

fn fetch_for_user(conn: &Connection, user: UserId) -> Result<Option<Profile>> {
    let profile = conn
        .query_row(
            &format!("{SELECT_PROFILE} WHERE user_id = ?1"),
            params![user.0],
            row_to_profile,
        )
        .optional()?;
    Ok(profile)
}

/// Map a `rusqlite::Row` to a [`Profile`].
fn row_to_profile(row: &rusqlite::Row<'_>) -> rusqlite::Result<Profile> {
    let id_str: String = row.get(0)?;
    let user_id: i64 = row.get(1)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Profile {
        id: ProfileId(id),
        user: UserId(user_id),
        badger: row.get(2)?,
        about: row.get(3)?,
        interests: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::open_with_users;
    use midimatrix_shared::ValidationError;

    #[test]
    fn create_and_read_back() {
        let db = open_with_users(&[1]);
        let created = db
            .create_profile(&NewProfile {
                user: UserId(1),
                badger: "synth nerd".into(),
                about: "Makes loops.".into(),
                interests: String::new(),
            })
            .unwrap();

        assert_eq!(db.get_profile(created.id).unwrap(), created);
        assert_eq!(db.get_profile_for_user(UserId(1)).unwrap(), created);
        assert_eq!(created.interests, "");
    }

    #[test]
    fn second_profile_for_user_is_rejected() {
        let db = open_with_users(&[1]);
        db.create_profile(&NewProfile::for_user(UserId(1))).unwrap();

        let err = db
            .create_profile(&NewProfile::for_user(UserId(1)))
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateProfile(UserId(1))));
        assert_eq!(db.list_profiles().unwrap().len(), 1);
    }

    #[test]
    fn unique_index_backs_the_duplicate_check() {
        let db = open_with_users(&[1]);
        let first = db.create_profile(&NewProfile::for_user(UserId(1))).unwrap();
        let clash = Profile {
            id: ProfileId::new(),
            ..first
        };
        let err = insert(db.conn(), &clash).unwrap_err();
        assert_eq!(constraint_kind(&err), Some(ffi::SQLITE_CONSTRAINT_UNIQUE));
    }

    #[test]
    fn text_with_embedded_nul_is_accepted() {
        let db = open_with_users(&[1]);
        let profile = db
            .create_profile(&NewProfile {
                about: "\0hidden".into(),
                ..NewProfile::for_user(UserId(1))
            })
            .unwrap();
        assert_eq!(db.get_profile(profile.id).unwrap().about, "\0hidden");
    }

    #[test]
    fn long_badger_is_rejected() {
        let db = open_with_users(&[1]);
        let err = db
            .create_profile(&NewProfile {
                badger: "x".repeat(31),
                ..NewProfile::for_user(UserId(1))
            })
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Validation(ValidationError::LengthExceeded { field: "badger", .. })
        ));
    }

    #[test]
    fn profile_for_unknown_user_is_rejected() {
        let db = open_with_users(&[]);
        let err = db
            .create_profile(&NewProfile::for_user(UserId(3)))
            .unwrap_err();
        assert!(matches!(err, StoreError::UnknownUser(UserId(3))));
    }

    #[test]
    fn get_or_create_is_stable() {
        let db = open_with_users(&[4]);
        let (first, created) = db.get_or_create_profile(UserId(4)).unwrap();
        assert!(created);
        let (second, created) = db.get_or_create_profile(UserId(4)).unwrap();
        assert!(!created);
        assert_eq!(first, second);
    }

    #[test]
    fn update_touches_only_given_fields() {
        let db = open_with_users(&[1]);
        let profile = db
            .create_profile(&NewProfile {
                about: "old about".into(),
                ..NewProfile::for_user(UserId(1))
            })
            .unwrap();

        let updated = db
            .update_profile(
                profile.id,
                &ProfileUpdate {
                    interests: Some("drones, arpeggios".into()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.about, "old about");
        assert_eq!(updated.interests, "drones, arpeggios");
        assert_eq!(db.get_profile(profile.id).unwrap(), updated);
    }

    #[test]
    fn update_rejects_long_badger_and_keeps_row() {
        let db = open_with_users(&[1]);
        let profile = db.create_profile(&NewProfile::for_user(UserId(1))).unwrap();
        let res = db.update_profile(
            profile.id,
            &ProfileUpdate {
                badger: Some("y".repeat(40)),
                ..Default::default()
            },
        );
        assert!(res.is_err());
        assert_eq!(db.get_profile(profile.id).unwrap().badger, "");
    }

    #[test]
    fn update_missing_profile_is_not_found() {
        let db = open_with_users(&[]);
        let res = db.update_profile(ProfileId::new(), &ProfileUpdate::default());
        assert!(matches!(res, Err(StoreError::NotFound)));
    }

    #[test]
    fn delete_frees_the_user_slot() {
        let db = open_with_users(&[1]);
        let profile = db.create_profile(&NewProfile::for_user(UserId(1))).unwrap();

        assert!(db.delete_profile(profile.id).unwrap());
        assert!(!db.delete_profile(profile.id).unwrap());
        assert!(db.create_profile(&NewProfile::for_user(UserId(1))).is_ok());
    }
}
