//! `annotations` queries — external collaborator table, consumed
//! delete only.

use cset_core::{CsetError, Revision};
use rusqlite::params;

/// Delete all rows whose `revision` is in the retiring set.
pub fn delete_by_revisions(
    conn: &rusqlite::Connection,
    revisions: &[Revision],
) -> Result<usize, CsetError> {
    if revisions.is_empty() {
        return Ok(0);
    }
    let tx = conn.unchecked_transaction()?;
    let mut deleted = 0usize;
    {
        let mut stmt = tx.prepare_cached("DELETE FROM annotations WHERE revision = ?1")?;
        for revision in revisions {
            deleted += stmt.execute(params![revision.as_str()])?;
        }
    }
    tx.commit()?;
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;
    use rusqlite::Connection;

    #[test]
    fn delete_by_revisions_removes_only_matching() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn.execute_batch(
            "INSERT INTO annotations (revision, file, data) VALUES
                ('aaaaaaaaaaaa', 'a.rs', '{}'),
                ('bbbbbbbbbbbb', 'b.rs', '{}');",
        )
        .unwrap();
        let deleted = delete_by_revisions(&conn, &[Revision::new("aaaaaaaaaaaa")]).unwrap();
        assert_eq!(deleted, 1);
        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM annotations", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 1);
    }
}
