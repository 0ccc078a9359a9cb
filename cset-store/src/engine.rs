//! `CsetStore` — the Log Store (C2) implementation.
//!
//! Wraps `DatabaseManager` (single connection, serialized internally).
//! Every public method here is one SQL transaction; cross-operation
//! atomicity (e.g. insert-then-compact, or the deleter's three
//! cascading deletes) is the caller's responsibility via the working
//! mutex in `cset-workers`.

use std::path::Path;

use cset_core::{CsetError, CsetRow, Revision};

use crate::connection::DatabaseManager;
use crate::{compact, queries};

pub struct CsetStore {
    db: DatabaseManager,
}

impl CsetStore {
    pub fn open(path: &Path) -> Result<Self, CsetError> {
        Ok(Self {
            db: DatabaseManager::open(path)?,
        })
    }

    pub fn open_in_memory() -> Result<Self, CsetError> {
        Ok(Self {
            db: DatabaseManager::open_in_memory()?,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.db.path()
    }

    pub fn checkpoint(&self) -> Result<(), CsetError> {
        self.db.checkpoint()
    }

    // ─── csetLog (C2 contract) ──────────────────────────────────────

    pub fn insert_batch(&self, rows: &[CsetRow]) -> Result<usize, CsetError> {
        self.db.with_conn(|conn| queries::cset_log::insert_batch(conn, rows))
    }

    pub fn compact(&self) -> Result<(), CsetError> {
        self.db.with_conn(compact::compact)
    }

    pub fn tip(&self) -> Result<Option<CsetRow>, CsetError> {
        self.db.with_conn(queries::cset_log::tip)
    }

    pub fn tail(&self) -> Result<Option<CsetRow>, CsetError> {
        self.db.with_conn(queries::cset_log::tail)
    }

    pub fn lookup_by_rev(&self, revision: &Revision) -> Result<Option<i64>, CsetError> {
        self.db
            .with_conn(|conn| queries::cset_log::lookup_by_rev(conn, revision))
    }

    pub fn range(&self, a: i64, b: i64) -> Result<Vec<CsetRow>, CsetError> {
        self.db.with_conn(|conn| queries::cset_log::range(conn, a, b))
    }

    pub fn update_timestamps(&self, updates: &[(Revision, i64)]) -> Result<usize, CsetError> {
        self.db
            .with_conn(|conn| queries::cset_log::update_timestamps(conn, updates))
    }

    pub fn delete_by_revs(&self, revisions: &[Revision]) -> Result<usize, CsetError> {
        self.db
            .with_conn(|conn| queries::cset_log::delete_by_revs(conn, revisions))
    }

    pub fn rowcount(&self) -> Result<i64, CsetError> {
        self.db.with_conn(queries::cset_log::rowcount)
    }

    pub fn all_rows_ascending(&self) -> Result<Vec<CsetRow>, CsetError> {
        self.db.with_conn(queries::cset_log::all_rows_ascending)
    }

    /// Insert a batch then compact, matching the store-level
    /// guarantee that "after any append or delete, revnums are
    /// densely contiguous on the next observed read" — the caller
    /// still must hold the working mutex across this call so no
    /// other worker's critical section interleaves with it.
    pub fn insert_batch_and_compact(&self, rows: &[CsetRow]) -> Result<usize, CsetError> {
        let inserted = self.insert_batch(rows)?;
        self.compact()?;
        self.check_consistency()?;
        Ok(inserted)
    }

    /// After a compact, `tip().revnum` must equal `rowcount()`. A
    /// mismatch means the AUTOINCREMENT assignment and the row count
    /// have diverged — treated as fatal to the current worker
    /// iteration (see the error handling design's "inconsistent
    /// counts" kind).
    pub fn check_consistency(&self) -> Result<(), CsetError> {
        let rowcount = self.rowcount()?;
        if rowcount == 0 {
            return Ok(());
        }
        let tip_revnum = self.tip()?.map(|r| r.revnum).unwrap_or(0);
        if tip_revnum != rowcount {
            return Err(CsetError::InconsistentCount {
                tip_revnum,
                rowcount,
            });
        }
        Ok(())
    }

    // ─── external collaborator tables ───────────────────────────────

    pub fn latest_file_mod_revisions_with_frontiers(
        &self,
        revisions: &[Revision],
    ) -> Result<Vec<Revision>, CsetError> {
        self.db
            .with_conn(|conn| queries::latest_file_mod::revisions_with_frontiers(conn, revisions))
    }

    pub fn latest_file_mod_files_pointing_at(
        &self,
        revision: &Revision,
    ) -> Result<Vec<String>, CsetError> {
        self.db
            .with_conn(|conn| queries::latest_file_mod::files_pointing_at(conn, revision))
    }

    pub fn delete_latest_file_mod(&self, revisions: &[Revision]) -> Result<usize, CsetError> {
        self.db
            .with_conn(|conn| queries::latest_file_mod::delete_by_revisions(conn, revisions))
    }

    pub fn delete_annotations(&self, revisions: &[Revision]) -> Result<usize, CsetError> {
        self.db
            .with_conn(|conn| queries::annotations::delete_by_revisions(conn, revisions))
    }

    /// Raw connection access for operations not yet covered above.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, CsetError>
    where
        F: FnOnce(&rusqlite::Connection) -> Result<T, CsetError>,
    {
        self.db.with_conn(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(revnum: i64, revision: &str, timestamp: i64) -> CsetRow {
        CsetRow {
            revnum,
            revision: Revision::new(revision),
            timestamp,
        }
    }

    #[test]
    fn insert_batch_and_compact_leaves_dense_revnums() {
        let store = CsetStore::open_in_memory().unwrap();
        store
            .insert_batch_and_compact(&[
                row(0, "aaaaaaaaaaaa", -1),
                row(-1, "bbbbbbbbbbbb", -1),
            ])
            .unwrap();
        let rows = store.range(i64::MIN, i64::MAX).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].revnum, 1);
        assert_eq!(rows[1].revnum, 2);
        assert_eq!(store.tip().unwrap().unwrap().revnum, store.rowcount().unwrap());
    }

    #[test]
    fn cascading_delete_round_trip() {
        let store = CsetStore::open_in_memory().unwrap();
        store
            .insert_batch_and_compact(&[
                row(0, "aaaaaaaaaaaa", -1),
                row(1, "bbbbbbbbbbbb", -1),
            ])
            .unwrap();
        store
            .with_conn(|conn| {
                conn.execute_batch(
                    "INSERT INTO latestFileMod (file, revision) VALUES ('a.rs', 'aaaaaaaaaaaa');
                     INSERT INTO annotations (revision, file, data) VALUES ('aaaaaaaaaaaa', 'a.rs', '{}');",
                )?;
                Ok(())
            })
            .unwrap();

        let target = Revision::new("aaaaaaaaaaaa");
        store.delete_latest_file_mod(&[target.clone()]).unwrap();
        store.delete_annotations(&[target.clone()]).unwrap();
        store.delete_by_revs(&[target]).unwrap();
        store.compact().unwrap();

        assert_eq!(store.rowcount().unwrap(), 1);
        assert_eq!(
            store.latest_file_mod_files_pointing_at(&Revision::new("aaaaaaaaaaaa")).unwrap().len(),
            0
        );
    }
}
