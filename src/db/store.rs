//! Append-only case store shared across requests.
//!
//! Each request performs at most one lookup and one insert. Stored cases are
//! immutable, so a lookup followed by an insert needs no surrounding lock.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use super::repository;
use super::sqlite::{open_database, open_memory_database};
use super::DatabaseError;
use crate::models::{Case, NewCase};

/// Storage seam for triage cases.
pub trait CaseStore: Send + Sync {
    /// Persist a new case; the store assigns its identifier.
    fn insert(&self, case: &NewCase) -> Result<Case, DatabaseError>;

    fn get(&self, id: i64) -> Result<Option<Case>, DatabaseError>;

    /// All cases, newest first.
    fn list(&self) -> Result<Vec<Case>, DatabaseError>;
}

/// SQLite-backed store. A single connection serialised behind a mutex.
pub struct SqliteCaseStore {
    conn: Mutex<Connection>,
}

impl SqliteCaseStore {
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        Ok(Self::from_connection(open_database(path)?))
    }

    pub fn in_memory() -> Result<Self, DatabaseError> {
        Ok(Self::from_connection(open_memory_database()?))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, DatabaseError>,
    ) -> Result<T, DatabaseError> {
        let conn = self.conn.lock().map_err(|_| DatabaseError::LockPoisoned)?;
        f(&conn)
    }
}

impl CaseStore for SqliteCaseStore {
    fn insert(&self, case: &NewCase) -> Result<Case, DatabaseError> {
        self.with_conn(|conn| repository::insert_case(conn, case))
    }

    fn get(&self, id: i64) -> Result<Option<Case>, DatabaseError> {
        self.with_conn(|conn| repository::get_case(conn, id))
    }

    fn list(&self) -> Result<Vec<Case>, DatabaseError> {
        self.with_conn(repository::list_cases)
    }
}
