//! Single-connection database manager.
//!
//! The concurrency model keeps exactly one SQL connection, serialized
//! by the engine's own transaction scope — there is no reader/writer
//! pool. Cross-operation atomicity (holding the mutex across several
//! SQL statements) is layered on top by callers via the working mutex
//! in `cset-workers`; `DatabaseManager` only guarantees that no two
//! threads touch the `rusqlite::Connection` at once.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use cset_core::CsetError;
use rusqlite::Connection;

pub mod pragmas {
    use cset_core::CsetError;
    use rusqlite::Connection;

    /// WAL mode with a busy timeout, applied to every connection this
    /// crate opens.
    pub fn apply_pragmas(conn: &Connection) -> Result<(), CsetError> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(std::time::Duration::from_secs(30))?;
        Ok(())
    }
}

pub struct DatabaseManager {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
}

impl DatabaseManager {
    /// Open a file-backed database, applying pragmas and running
    /// migrations.
    pub fn open(path: &Path) -> Result<Self, CsetError> {
        let conn = Connection::open(path)?;
        pragmas::apply_pragmas(&conn)?;
        crate::migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: Some(path.to_path_buf()),
        })
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory() -> Result<Self, CsetError> {
        let conn = Connection::open_in_memory()?;
        pragmas::apply_pragmas(&conn)?;
        crate::migrations::run_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            path: None,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run `f` with exclusive access to the connection. There is no
    /// separate read path: SQLite's own transaction isolation is
    /// sufficient for the facade's uncoordinated reads (see the
    /// concurrency model in the crate root docs).
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, CsetError>
    where
        F: FnOnce(&Connection) -> Result<T, CsetError>,
    {
        let conn = self.conn.lock().expect("database mutex poisoned");
        f(&conn)
    }

    pub fn checkpoint(&self) -> Result<(), CsetError> {
        self.with_conn(|conn| {
            conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE)")?;
            Ok(())
        })
    }
}
