//! CRUD operations for [`Matrix`] records.
//!
//! `ctime` is written once on insert. `mtime` is refreshed by every
//! successful update and is strictly increasing per record.

use midimatrix_shared::validation::{validate_matrix_name, validate_matrix_text};
use midimatrix_shared::{MatrixId, UserId};
use rusqlite::{ffi, params, Connection};
use uuid::Uuid;

use crate::database::Database;
use crate::error::{constraint_kind, not_found, Result, StoreError};
use crate::models::{Matrix, MatrixUpdate, NewMatrix};
use crate::timestamps;
use crate::users::user_exists_in;

const SELECT_MATRIX: &str =
    "SELECT id, author_id, ctime, mtime, name, description, matrix FROM matrices";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new matrix. `ctime` and `mtime` are both set to now.
    pub fn create_matrix(&self, new: &NewMatrix) -> Result<Matrix> {
        validate_matrix_name(&new.name)?;
        validate_matrix_text("description", &new.description)?;
        validate_matrix_text("matrix", &new.matrix)?;

        let tx = self.transaction()?;

        if !user_exists_in(&tx, new.author)? {
            return Err(StoreError::UnknownUser(new.author));
        }

        let now = timestamps::now();
        let matrix = Matrix {
            id: MatrixId::new(),
            author: new.author,
            ctime: now,
            mtime: now,
            name: new.name.clone(),
            description: new.description.clone(),
            matrix: new.matrix.clone(),
        };

        insert(&tx, &matrix).map_err(|e| unknown_author(e, matrix.author))?;
        tx.commit()?;

        tracing::debug!(matrix_id = %matrix.id, author = %matrix.author, "created matrix");
        Ok(matrix)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_matrix(&self, id: MatrixId) -> Result<Matrix> {
        fetch(self.conn(), id)
    }

    /// All matrices by `author`, most recently modified first.
    pub fn list_matrices_by_author(&self, author: UserId) -> Result<Vec<Matrix>> {
        let mut stmt = self.conn().prepare(&format!(
            "{SELECT_MATRIX} WHERE author_id = ?1 ORDER BY mtime DESC"
        ))?;
        let rows = stmt.query_map(params![author.0], row_to_matrix)?;

        let mut matrices = Vec::new();
        for row in rows {
            matrices.push(row?);
        }
        Ok(matrices)
    }

    /// All matrices, most recently modified first.
    pub fn list_matrices(&self) -> Result<Vec<Matrix>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("{SELECT_MATRIX} ORDER BY mtime DESC"))?;
        let rows = stmt.query_map([], row_to_matrix)?;

        let mut matrices = Vec::new();
        for row in rows {
            matrices.push(row?);
        }
        Ok(matrices)
    }

    pub fn count_matrices_by_author(&self, author: UserId) -> Result<usize> {
        let n: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM matrices WHERE author_id = ?1",
            params![author.0],
            |row| row.get(0),
        )?;
        Ok(n as usize)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Apply a partial update. `mtime` moves forward even when the patch
    /// is empty, as every save counts as a modification.
    pub fn update_matrix(&self, id: MatrixId, update: &MatrixUpdate) -> Result<Matrix> {
        if let Some(name) = &update.name {
            validate_matrix_name(name)?;
        }
        if let Some(description) = &update.description {
            validate_matrix_text("description", description)?;
        }
        if let Some(payload) = &update.matrix {
            validate_matrix_text("matrix", payload)?;
        }

        let tx = self.transaction()?;
        let mut matrix = fetch(&tx, id)?;

        if let Some(author) = update.author {
            if !user_exists_in(&tx, author)? {
                return Err(StoreError::UnknownUser(author));
            }
            matrix.author = author;
        }
        if let Some(name) = &update.name {
            matrix.name = name.clone();
        }
        if let Some(description) = &update.description {
            matrix.description = description.clone();
        }
        if let Some(payload) = &update.matrix {
            matrix.matrix = payload.clone();
        }
        matrix.mtime = timestamps::next_after(matrix.mtime);

        tx.execute(
            "UPDATE matrices
             SET author_id = ?1, name = ?2, description = ?3, matrix = ?4, mtime = ?5
             WHERE id = ?6",
            params![
                matrix.author.0,
                matrix.name,
                matrix.description,
                matrix.matrix,
                timestamps::encode(&matrix.mtime),
                id.to_string(),
            ],
        )
        .map_err(|e| unknown_author(e, matrix.author))?;
        tx.commit()?;

        tracing::debug!(matrix_id = %id, mtime = %matrix.mtime, "updated matrix");
        Ok(matrix)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a matrix by id. Returns `true` if a row was deleted.
    pub fn delete_matrix(&self, id: MatrixId) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM matrices WHERE id = ?1", params![id.to_string()])?;
        if affected > 0 {
            tracing::debug!(matrix_id = %id, "deleted matrix");
        }
        Ok(affected > 0)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn insert(conn: &Connection, matrix: &Matrix) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO matrices (id, author_id, ctime, mtime, name, description, matrix)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            matrix.id.to_string(),
            matrix.author.0,
            timestamps::encode(&matrix.ctime),
            timestamps::encode(&matrix.mtime),
            matrix.name,
            matrix.description,
            matrix.matrix,
        ],
    )
}

fn fetch(conn: &Connection, id: MatrixId) -> Result<Matrix> {
    conn.query_row(
        &format!("{SELECT_MATRIX} WHERE id = ?1"),
        params![id.to_string()],
        row_to_matrix,
    )
    .map_err(not_found)
}

fn unknown_author(e: rusqlite::Error, author: UserId) -> StoreError {
    match constraint_kind(&e) {
        Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => StoreError::UnknownUser(author),
        _ => StoreError::Sqlite(e),
    }
}

/// Map a `rusqlite::Row` to a [`Matrix`].
fn row_to_matrix(row: &rusqlite::Row<'_>) -> rusqlite::Result<Matrix> {
    let id_str: String = row.get(0)?;
    let author_id: i64 = row.get(1)?;
    let ctime_str: String = row.get(2)?;
    let mtime_str: String = row.get(3)?;

    let id = Uuid::parse_str(&id_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let ctime = timestamps::decode(&ctime_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let mtime = timestamps::decode(&mtime_str).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Matrix {
        id: MatrixId(id),
        author: UserId(author_id),
        ctime,
        mtime,
        name: row.get(4)?,
        description: row.get(5)?,
        matrix: row.get(6)?,
    })
}
