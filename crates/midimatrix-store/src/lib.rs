//! # midimatrix-store
//!
//! Local persistence for MidiMatrix user profiles and sequencer matrices,
//! backed by SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for every domain
//! model. Users themselves belong to an external identity subsystem; the
//! store mirrors their ids to keep references valid.

pub mod backup;
pub mod config;
pub mod database;
pub mod matrices;
pub mod migrations;
pub mod models;
pub mod profiles;
pub mod users;

mod error;
mod timestamps;

pub use config::{DeletePolicy, StoreConfig};
pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
pub use users::UserDirectory;

pub use midimatrix_shared::{MatrixId, ProfileId, UserId, ValidationError};
