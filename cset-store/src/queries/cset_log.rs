//! `csetLog` table queries — the Log Store (C2) contract.

use cset_core::constants::SQL_CSET_BATCH_SIZE;
use cset_core::{CsetError, CsetRow, Revision};
use rusqlite::{params, Connection, Row};

fn map_row(row: &Row<'_>) -> rusqlite::Result<CsetRow> {
    let revision: String = row.get(1)?;
    Ok(CsetRow {
        revnum: row.get(0)?,
        revision: Revision::new(revision),
        timestamp: row.get(2)?,
    })
}

/// Insert rows, skipping any whose `revision` already exists.
/// Idempotent on identifier collision — concurrent overlap between a
/// tip extension and a backfill is expected and harmless.
///
/// `rows` is chunked into groups of at most [`SQL_CSET_BATCH_SIZE`]
/// within a single transaction, matching the upstream batching
/// behaviour. Callers own the explicit `revnum` assigned to each row
/// (see the range filler's provisional-numbering step); this function
/// never assigns one itself.
pub fn insert_batch(conn: &Connection, rows: &[CsetRow]) -> Result<usize, CsetError> {
    if rows.is_empty() {
        return Ok(0);
    }

    let tx = conn.unchecked_transaction()?;
    let mut inserted = 0usize;
    {
        let mut stmt = tx.prepare_cached(
            "INSERT OR IGNORE INTO csetLog (revnum, revision, timestamp) VALUES (?1, ?2, ?3)",
        )?;
        for chunk in rows.chunks(SQL_CSET_BATCH_SIZE) {
            for row in chunk {
                inserted +=
                    stmt.execute(params![row.revnum, row.revision.as_str(), row.timestamp])?;
            }
        }
    }
    tx.commit()?;
    Ok(inserted)
}

/// The newest row (largest revnum), or `None` if the table is empty.
pub fn tip(conn: &Connection) -> Result<Option<CsetRow>, CsetError> {
    conn.query_row(
        "SELECT revnum, revision, timestamp FROM csetLog ORDER BY revnum DESC LIMIT 1",
        [],
        map_row,
    )
    .map(Some)
    .or_else(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => Ok(None),
        other => Err(other.into()),
    })
}

/// The oldest row (smallest revnum), or `None` if the table is empty.
pub fn tail(conn: &Connection) -> Result<Option<CsetRow>, CsetError> {
    conn.query_row(
        "SELECT revnum, revision, timestamp FROM csetLog ORDER BY revnum ASC LIMIT 1",
        [],
        map_row,
    )
    .map(Some)
    .or_else(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => Ok(None),
        other => Err(other.into()),
    })
}

/// The revnum of `revision`, or `None` if it is not resident.
pub fn lookup_by_rev(conn: &Connection, revision: &Revision) -> Result<Option<i64>, CsetError> {
    conn.query_row(
        "SELECT revnum FROM csetLog WHERE revision = ?1",
        params![revision.as_str()],
        |row| row.get(0),
    )
    .map(Some)
    .or_else(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => Ok(None),
        other => Err(other.into()),
    })
}

/// All rows with `revnum` between the two bounds inclusive, ascending
/// by revnum, regardless of the order the bounds are supplied in.
pub fn range(conn: &Connection, a: i64, b: i64) -> Result<Vec<CsetRow>, CsetError> {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut stmt = conn.prepare_cached(
        "SELECT revnum, revision, timestamp FROM csetLog
         WHERE revnum BETWEEN ?1 AND ?2 ORDER BY revnum ASC",
    )?;
    let rows = stmt.query_map(params![lo, hi], map_row)?;
    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

/// Bulk-update the `timestamp` column for a set of existing revisions.
pub fn update_timestamps(conn: &Connection, updates: &[(Revision, i64)]) -> Result<usize, CsetError> {
    if updates.is_empty() {
        return Ok(0);
    }
    let tx = conn.unchecked_transaction()?;
    let mut updated = 0usize;
    {
        let mut stmt =
            tx.prepare_cached("UPDATE csetLog SET timestamp = ?1 WHERE revision = ?2")?;
        for (revision, timestamp) in updates {
            updated += stmt.execute(params![timestamp, revision.as_str()])?;
        }
    }
    tx.commit()?;
    Ok(updated)
}

/// Delete rows by revision. Each call is its own transaction; callers
/// that need several cascading deletes atomic with this one hold the
/// working mutex across all of them (see `cset-workers`).
pub fn delete_by_revs(conn: &Connection, revisions: &[Revision]) -> Result<usize, CsetError> {
    if revisions.is_empty() {
        return Ok(0);
    }
    let tx = conn.unchecked_transaction()?;
    let mut deleted = 0usize;
    {
        let mut stmt = tx.prepare_cached("DELETE FROM csetLog WHERE revision = ?1")?;
        for revision in revisions {
            deleted += stmt.execute(params![revision.as_str()])?;
        }
    }
    tx.commit()?;
    Ok(deleted)
}

pub fn rowcount(conn: &Connection) -> Result<i64, CsetError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM csetLog", [], |row| row.get(0))?)
}

/// All rows ordered ascending by revnum. Used by the maintenance
/// worker, which needs the whole table to walk newest-to-oldest.
pub fn all_rows_ascending(conn: &Connection) -> Result<Vec<CsetRow>, CsetError> {
    let mut stmt =
        conn.prepare_cached("SELECT revnum, revision, timestamp FROM csetLog ORDER BY revnum ASC")?;
    let rows = stmt.query_map([], map_row)?;
    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;

    fn row(revnum: i64, revision: &str, timestamp: i64) -> CsetRow {
        CsetRow {
            revnum,
            revision: Revision::new(revision),
            timestamp,
        }
    }

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn insert_batch_skips_existing_revisions() {
        let conn = setup();
        insert_batch(&conn, &[row(1, "aaaaaaaaaaaa", -1)]).unwrap();
        let n = insert_batch(
            &conn,
            &[row(1, "aaaaaaaaaaaa", -1), row(2, "bbbbbbbbbbbb", -1)],
        )
        .unwrap();
        assert_eq!(n, 1);
        assert_eq!(rowcount(&conn).unwrap(), 2);
    }

    #[test]
    fn tip_and_tail_round_trip() {
        let conn = setup();
        insert_batch(
            &conn,
            &[row(1, "aaaaaaaaaaaa", -1), row(2, "bbbbbbbbbbbb", -1)],
        )
        .unwrap();
        assert_eq!(tip(&conn).unwrap().unwrap().revision.as_str(), "bbbbbbbbbbbb");
        assert_eq!(tail(&conn).unwrap().unwrap().revision.as_str(), "aaaaaaaaaaaa");
    }

    #[test]
    fn lookup_by_rev_matches_range_of_one() {
        let conn = setup();
        insert_batch(&conn, &[row(1, "aaaaaaaaaaaa", -1)]).unwrap();
        let rev = Revision::new("aaaaaaaaaaaa");
        let revnum = lookup_by_rev(&conn, &rev).unwrap().unwrap();
        let r = range(&conn, revnum, revnum).unwrap();
        assert_eq!(r.len(), 1);
        assert_eq!(r[0].revision, rev);
    }

    #[test]
    fn range_is_order_independent() {
        let conn = setup();
        insert_batch(
            &conn,
            &[
                row(1, "aaaaaaaaaaaa", -1),
                row(2, "bbbbbbbbbbbb", -1),
                row(3, "cccccccccccc", -1),
            ],
        )
        .unwrap();
        let forward = range(&conn, 1, 3).unwrap();
        let backward = range(&conn, 3, 1).unwrap();
        assert_eq!(forward, backward);
        assert_eq!(forward.len(), 3);
    }

    #[test]
    fn delete_by_revs_removes_matching_rows_only() {
        let conn = setup();
        insert_batch(
            &conn,
            &[row(1, "aaaaaaaaaaaa", -1), row(2, "bbbbbbbbbbbb", -1)],
        )
        .unwrap();
        delete_by_revs(&conn, &[Revision::new("aaaaaaaaaaaa")]).unwrap();
        assert_eq!(rowcount(&conn).unwrap(), 1);
        assert!(lookup_by_rev(&conn, &Revision::new("bbbbbbbbbbbb"))
            .unwrap()
            .is_some());
    }
}
