//! SQLite file backing the preference store.
//!
//! # Responsibility
//! - Open the preference database and bring its schema up to date.
//! - Report which bootstrap step failed and for which target.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - A connection is handed out only after every migration applied.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure while preparing the preference database.
#[derive(Debug)]
pub enum DbError {
    /// SQLite could not open or configure `target` (a path or `:memory:`).
    Open {
        target: String,
        source: rusqlite::Error,
    },
    /// `PRAGMA user_version` could not be read.
    SchemaProbe(rusqlite::Error),
    /// Migration `version` failed; pending steps were rolled back.
    Migration {
        version: u32,
        source: rusqlite::Error,
    },
    /// The file was written by a newer build.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open { target, source } => {
                write!(f, "cannot open preference database `{target}`: {source}")
            }
            Self::SchemaProbe(source) => {
                write!(f, "cannot read preference schema version: {source}")
            }
            Self::Migration { version, source } => {
                write!(f, "preference schema migration {version} failed: {source}")
            }
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "preference schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Open { source, .. } | Self::Migration { source, .. } => Some(source),
            Self::SchemaProbe(source) => Some(source),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}
