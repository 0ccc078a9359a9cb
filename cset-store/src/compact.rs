//! The `compact` primitive: renumber `revnum` densely in current
//! revnum order.
//!
//! `revnum` is an `AUTOINCREMENT` primary key, so insert-order
//! renumbering falls out of the insert itself: create a temp table
//! with the same schema, copy rows ordered by the current `revnum`
//! (omitting the `revnum` column so the new table assigns its own
//! `1..N`), drop the original, rename the temp table into place.

use cset_core::CsetError;
use rusqlite::Connection;

pub fn compact(conn: &Connection) -> Result<(), CsetError> {
    conn.execute_batch(
        "
        CREATE TABLE csetLog_compact_temp (
            revnum INTEGER PRIMARY KEY AUTOINCREMENT,
            revision CHAR(12) NOT NULL UNIQUE,
            timestamp INTEGER
        );

        INSERT INTO csetLog_compact_temp (revision, timestamp)
        SELECT revision, timestamp FROM csetLog ORDER BY revnum ASC;

        DROP TABLE csetLog;

        ALTER TABLE csetLog_compact_temp RENAME TO csetLog;
        ",
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;
    use crate::queries::cset_log::{insert_batch, range, rowcount, tip};
    use cset_core::{CsetRow, Revision};

    fn row(revnum: i64, revision: &str, timestamp: i64) -> CsetRow {
        CsetRow {
            revnum,
            revision: Revision::new(revision),
            timestamp,
        }
    }

    #[test]
    fn compact_renumbers_densely_after_negative_provisional_revnums() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        // Simulate provisional descending negative revnums from a
        // backward fill, inserted directly (bypassing the
        // AUTOINCREMENT path the way insert_batch does for backfills).
        conn.execute_batch(
            "
            INSERT INTO csetLog (revnum, revision, timestamp) VALUES
                (0, 'aaaaaaaaaaaa', -1),
                (-1, 'bbbbbbbbbbbb', -1),
                (-2, 'cccccccccccc', -1);
            ",
        )
        .unwrap();

        compact(&conn).unwrap();

        let rows = range(&conn, i64::MIN, i64::MAX).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].revnum, 1);
        assert_eq!(rows[0].revision.as_str(), "cccccccccccc");
        assert_eq!(rows[1].revnum, 2);
        assert_eq!(rows[1].revision.as_str(), "bbbbbbbbbbbb");
        assert_eq!(rows[2].revnum, 3);
        assert_eq!(rows[2].revision.as_str(), "aaaaaaaaaaaa");

        let t = tip(&conn).unwrap().unwrap();
        assert_eq!(t.revnum, rowcount(&conn).unwrap());
    }

    #[test]
    fn compact_on_empty_table_is_a_noop() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        compact(&conn).unwrap();
        assert_eq!(rowcount(&conn).unwrap(), 0);
    }

    proptest::proptest! {
        #[test]
        fn revnums_stay_dense_after_any_insert_compact_sequence(
            ids in proptest::collection::hash_set(0u32..5000, 1..40),
            batch_size in 1usize..6,
        ) {
            let conn = Connection::open_in_memory().unwrap();
            run_migrations(&conn).unwrap();

            let mut ids: Vec<u32> = ids.into_iter().collect();
            ids.sort_unstable();
            let rows: Vec<CsetRow> = ids
                .iter()
                .map(|id| row(0, &format!("{id:012x}"), -1))
                .collect();

            for chunk in rows.chunks(batch_size) {
                insert_batch(&conn, chunk).unwrap();
                compact(&conn).unwrap();
            }

            let all_rows = range(&conn, i64::MIN, i64::MAX).unwrap();
            let revnums: Vec<i64> = all_rows.iter().map(|r| r.revnum).collect();
            let expected: Vec<i64> = (1..=all_rows.len() as i64).collect();
            proptest::prop_assert_eq!(revnums, expected);
            proptest::prop_assert_eq!(all_rows.len(), rows.len());
        }
    }

    #[test]
    fn insert_then_compact_twice_matches_single_batch() {
        let conn_a = Connection::open_in_memory().unwrap();
        run_migrations(&conn_a).unwrap();
        insert_batch(&conn_a, &[row(0, "111111111111", -1)]).unwrap();
        compact(&conn_a).unwrap();
        insert_batch(&conn_a, &[row(0, "222222222222", -1)]).unwrap();
        compact(&conn_a).unwrap();

        let conn_b = Connection::open_in_memory().unwrap();
        run_migrations(&conn_b).unwrap();
        insert_batch(
            &conn_b,
            &[row(0, "111111111111", -1), row(1, "222222222222", -1)],
        )
        .unwrap();
        compact(&conn_b).unwrap();

        let a = range(&conn_a, i64::MIN, i64::MAX).unwrap();
        let b = range(&conn_b, i64::MIN, i64::MAX).unwrap();
        let a_revisions: Vec<_> = a.iter().map(|r| r.revision.as_str()).collect();
        let b_revisions: Vec<_> = b.iter().map(|r| r.revision.as_str()).collect();
        assert_eq!(a_revisions, b_revisions);
    }
}
