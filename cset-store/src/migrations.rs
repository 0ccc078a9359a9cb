//! Schema migrations.
//!
//! Creates the `csetLog` table and the minimal shapes of its two
//! external collaborator tables (`annotations`, `latestFileMod`) so
//! that integration tests and a standalone deployment of this crate
//! have somewhere to cascade deletes into. A real deployment that
//! already owns those tables runs this crate's migrations after its
//! own — `CREATE TABLE IF NOT EXISTS` makes both orders safe.

use cset_core::CsetError;
use rusqlite::Connection;

const SCHEMA_VERSION: u32 = 1;

pub fn run_migrations(conn: &Connection) -> Result<(), CsetError> {
    let current = current_version(conn)?;
    if current >= SCHEMA_VERSION {
        return Ok(());
    }

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS csetLog (
            revnum INTEGER PRIMARY KEY AUTOINCREMENT,
            revision CHAR(12) NOT NULL UNIQUE,
            timestamp INTEGER
        );

        CREATE TABLE IF NOT EXISTS annotations (
            revision CHAR(12) NOT NULL,
            file TEXT,
            data TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_annotations_revision ON annotations(revision);

        CREATE TABLE IF NOT EXISTS latestFileMod (
            file TEXT NOT NULL,
            revision CHAR(12) NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_latestfilemod_revision ON latestFileMod(revision);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_latestfilemod_file ON latestFileMod(file);
        ",
    )?;

    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    Ok(())
}

pub fn current_version(conn: &Connection) -> Result<u32, CsetError> {
    let version: u32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();
        assert_eq!(current_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    fn get_table_columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .unwrap();
        stmt.query_map([], |row| row.get::<_, String>(1))
            .unwrap()
            .map(|r| r.unwrap())
            .collect()
    }

    #[test]
    fn cset_log_has_expected_columns() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        let cols = get_table_columns(&conn, "csetLog");
        assert_eq!(cols, vec!["revnum", "revision", "timestamp"]);
    }
}
