//! Key-value preference repository contracts and implementations.
//!
//! # Responsibility
//! - Persist opaque byte snapshots under string keys.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - `save` replaces any previous value stored under the same key.
//! - `load` returns `Ok(None)` for a key that was never saved.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::{open_db, open_db_in_memory, DbError};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

pub type PrefResult<T> = Result<T, PrefRepoError>;

/// Preference persistence error.
#[derive(Debug)]
pub enum PrefRepoError {
    /// The preference database could not be opened or migrated.
    Db(DbError),
    /// A statement for `op` failed; `key` is set for single-key operations.
    Query {
        op: &'static str,
        key: Option<String>,
        source: rusqlite::Error,
    },
    /// Connection was handed over without the expected schema.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Backend refused the operation (e.g. read-only or detached store).
    Unavailable(String),
}

impl Display for PrefRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Query {
                op,
                key: Some(key),
                source,
            } => write!(f, "preference {op} failed for key `{key}`: {source}"),
            Self::Query {
                op,
                key: None,
                source,
            } => write!(f, "preference {op} failed: {source}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "preference repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::Unavailable(message) => write!(f, "preference store unavailable: {message}"),
        }
    }
}

impl Error for PrefRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Query { source, .. } => Some(source),
            Self::UninitializedConnection { .. } => None,
            Self::Unavailable(_) => None,
        }
    }
}

impl From<DbError> for PrefRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

fn query_failed(op: &'static str, key: Option<&str>) -> impl FnOnce(rusqlite::Error) -> PrefRepoError {
    let key = key.map(str::to_string);
    move |source| PrefRepoError::Query { op, key, source }
}

/// Persistence provider used by `TaskStore`.
pub trait PreferenceRepository {
    /// Stores `value` under `key`, replacing any previous value.
    fn save(&mut self, key: &str, value: &[u8]) -> PrefResult<()>;
    /// Loads the value stored under `key`, if any.
    fn load(&self, key: &str) -> PrefResult<Option<Vec<u8>>>;
}

impl<R: PreferenceRepository + ?Sized> PreferenceRepository for Box<R> {
    fn save(&mut self, key: &str, value: &[u8]) -> PrefResult<()> {
        (**self).save(key, value)
    }

    fn load(&self, key: &str) -> PrefResult<Option<Vec<u8>>> {
        (**self).load(key)
    }
}

/// Process-local preference map.
///
/// Failure switches let tests exercise the store's degraded path.
#[derive(Debug, Default, Clone)]
pub struct MemoryPreferenceRepository {
    values: BTreeMap<String, Vec<u8>>,
    fail_saves: bool,
    fail_loads: bool,
    save_count: usize,
}

impl MemoryPreferenceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository pre-seeded with one key.
    pub fn with_value(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        let mut repo = Self::default();
        repo.values.insert(key.into(), value.into());
        repo
    }

    /// Makes every subsequent `save` fail.
    pub fn fail_saves(&mut self, fail: bool) {
        self.fail_saves = fail;
    }

    /// Makes every subsequent `load` fail.
    pub fn fail_loads(&mut self, fail: bool) {
        self.fail_loads = fail;
    }

    /// Number of successful saves since construction.
    pub fn save_count(&self) -> usize {
        self.save_count
    }

    /// Returns the raw stored bytes for `key`.
    pub fn raw(&self, key: &str) -> Option<&[u8]> {
        self.values.get(key).map(Vec::as_slice)
    }
}

impl PreferenceRepository for MemoryPreferenceRepository {
    fn save(&mut self, key: &str, value: &[u8]) -> PrefResult<()> {
        if self.fail_saves {
            return Err(PrefRepoError::Unavailable(format!(
                "save rejected for key `{key}`"
            )));
        }
        self.values.insert(key.to_string(), value.to_vec());
        self.save_count += 1;
        Ok(())
    }

    fn load(&self, key: &str) -> PrefResult<Option<Vec<u8>>> {
        if self.fail_loads {
            return Err(PrefRepoError::Unavailable(format!(
                "load rejected for key `{key}`"
            )));
        }
        Ok(self.values.get(key).cloned())
    }
}

/// SQLite-backed preference repository.
///
/// Owns its connection so the repository can live inside a long-lived store.
pub struct SqlitePreferenceRepository {
    conn: Connection,
}

impl SqlitePreferenceRepository {
    /// Wraps a connection that already has migrations applied.
    pub fn try_new(conn: Connection) -> PrefResult<Self> {
        let actual_version = current_user_version(&conn)?;
        let expected_version = latest_version();
        if actual_version != expected_version {
            return Err(PrefRepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }

    /// Opens (or creates) a preference database file.
    pub fn open(path: impl AsRef<Path>) -> PrefResult<Self> {
        Self::try_new(open_db(path)?)
    }

    /// Opens a throwaway in-memory preference database.
    pub fn open_in_memory() -> PrefResult<Self> {
        Self::try_new(open_db_in_memory()?)
    }

    /// Lists stored keys in ascending order.
    pub fn keys(&self) -> PrefResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM preferences ORDER BY key ASC;")
            .map_err(query_failed("keys", None))?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(query_failed("keys", None))?;
        rows.collect::<rusqlite::Result<Vec<_>>>()
            .map_err(query_failed("keys", None))
    }

    /// Removes one key. Returns whether a row was deleted.
    pub fn remove(&mut self, key: &str) -> PrefResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM preferences WHERE key = ?1;", [key])
            .map_err(query_failed("remove", Some(key)))?;
        Ok(changed > 0)
    }
}

impl PreferenceRepository for SqlitePreferenceRepository {
    fn save(&mut self, key: &str, value: &[u8]) -> PrefResult<()> {
        self.conn
            .execute(
                "INSERT INTO preferences (key, value, updated_at)
                 VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at;",
                params![key, value],
            )
            .map_err(query_failed("save", Some(key)))?;
        Ok(())
    }

    fn load(&self, key: &str) -> PrefResult<Option<Vec<u8>>> {
        self.conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1;",
                [key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()
            .map_err(query_failed("load", Some(key)))
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryPreferenceRepository, PrefRepoError, PreferenceRepository};

    #[test]
    fn memory_repo_overwrites_and_counts_saves() {
        let mut repo = MemoryPreferenceRepository::new();
        assert!(repo.load("k").unwrap().is_none());

        repo.save("k", b"one").unwrap();
        repo.save("k", b"two").unwrap();

        assert_eq!(repo.load("k").unwrap().as_deref(), Some(&b"two"[..]));
        assert_eq!(repo.save_count(), 2);
    }

    #[test]
    fn memory_repo_failure_switches() {
        let mut repo = MemoryPreferenceRepository::with_value("k", b"v".to_vec());
        repo.fail_saves(true);
        repo.fail_loads(true);

        assert!(matches!(
            repo.save("k", b"x"),
            Err(PrefRepoError::Unavailable(_))
        ));
        assert!(matches!(repo.load("k"), Err(PrefRepoError::Unavailable(_))));

        repo.fail_loads(false);
        assert_eq!(repo.load("k").unwrap().as_deref(), Some(&b"v"[..]));
        assert_eq!(repo.save_count(), 0);
    }
}
