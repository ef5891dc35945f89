//! Domain model structs persisted in the local SQLite database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be handed
//! directly to a web or API layer.

use chrono::{DateTime, Utc};
use midimatrix_shared::{MatrixId, ProfileId, UserId};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Free-text metadata attached to exactly one user.
///
/// Blank fields are stored as empty strings, never NULL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub id: ProfileId,
    /// Owning user. Unique across all profiles.
    pub user: UserId,
    /// Short tagline, at most 30 characters.
    pub badger: String,
    pub about: String,
    pub interests: String,
}

/// Input for [`Database::create_profile`](crate::Database::create_profile).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewProfile {
    pub user: UserId,
    #[serde(default)]
    pub badger: String,
    #[serde(default)]
    pub about: String,
    #[serde(default)]
    pub interests: String,
}

impl NewProfile {
    /// An empty profile for `user`.
    pub fn for_user(user: UserId) -> Self {
        Self {
            user,
            badger: String::new(),
            about: String::new(),
            interests: String::new(),
        }
    }
}

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub badger: Option<String>,
    pub about: Option<String>,
    pub interests: Option<String>,
}

// ---------------------------------------------------------------------------
// Matrix
// ---------------------------------------------------------------------------

/// A user-authored sequencer matrix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Matrix {
    pub id: MatrixId,
    pub author: UserId,
    /// Set once on insert.
    pub ctime: DateTime<Utc>,
    /// Refreshed on every update; always `>= ctime`.
    pub mtime: DateTime<Utc>,
    /// At most 250 characters, never empty.
    pub name: String,
    pub description: String,
    /// Serialized payload. Opaque to the store.
    pub matrix: String,
}

/// Input for [`Database::create_matrix`](crate::Database::create_matrix).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewMatrix {
    pub author: UserId,
    pub name: String,
    pub description: String,
    pub matrix: String,
}

/// Partial update; `None` leaves a field untouched. `ctime` is not
/// updatable and `mtime` is managed by the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatrixUpdate {
    pub author: Option<UserId>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub matrix: Option<String>,
}

// ---------------------------------------------------------------------------
// User removal
// ---------------------------------------------------------------------------

/// Outcome of [`Database::delete_user`](crate::Database::delete_user).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserDeletion {
    pub profiles_removed: usize,
    pub matrices_removed: usize,
}
