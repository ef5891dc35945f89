//! v001 -- Initial schema creation.
//!
//! Creates `users`, `profiles` and `matrices`. Foreign keys carry no
//! `ON DELETE` action: removing a referenced user directly is rejected, and
//! the configured policy is applied by `Database::delete_user` instead.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users (mirror of ids owned by the identity subsystem)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id         INTEGER PRIMARY KEY NOT NULL
);

-- ----------------------------------------------------------------
-- Profiles (one per user)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS profiles (
    id        TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    user_id   INTEGER NOT NULL UNIQUE,       -- FK -> users(id)
    badger    TEXT NOT NULL DEFAULT '' CHECK (length(badger) <= 30),
    about     TEXT NOT NULL DEFAULT '',
    interests TEXT NOT NULL DEFAULT '',

    FOREIGN KEY (user_id) REFERENCES users(id)
);

-- ----------------------------------------------------------------
-- Matrices
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS matrices (
    id          TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    author_id   INTEGER NOT NULL,            -- FK -> users(id)
    ctime       TEXT NOT NULL,               -- RFC-3339, microseconds, UTC
    mtime       TEXT NOT NULL,
    name        TEXT NOT NULL CHECK (name <> '' AND length(name) <= 250),
    description TEXT NOT NULL CHECK (description <> ''),
    matrix      TEXT NOT NULL CHECK (matrix <> ''),

    CHECK (mtime >= ctime),
    FOREIGN KEY (author_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_matrices_author_mtime
    ON matrices(author_id, mtime DESC);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
