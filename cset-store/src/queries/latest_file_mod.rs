//! `latestFileMod` queries — external collaborator table, consumed
//! read/delete only (see the data model's external-table contract).

use cset_core::{CsetError, Revision};
use rusqlite::params;

/// Revisions (of `revisions`) that currently have at least one
/// `latestFileMod` row pointing at them.
pub fn revisions_with_frontiers(
    conn: &rusqlite::Connection,
    revisions: &[Revision],
) -> Result<Vec<Revision>, CsetError> {
    if revisions.is_empty() {
        return Ok(Vec::new());
    }
    let placeholders = vec!["?"; revisions.len()].join(",");
    let sql = format!(
        "SELECT DISTINCT revision FROM latestFileMod WHERE revision IN ({placeholders})"
    );
    let mut stmt = conn.prepare(&sql)?;
    let params: Vec<&dyn rusqlite::ToSql> =
        revisions.iter().map(|r| r.as_str() as &dyn rusqlite::ToSql).collect();
    let rows = stmt.query_map(params.as_slice(), |row| {
        row.get::<_, String>(0)
    })?;
    let mut result = Vec::new();
    for row in rows {
        result.push(Revision::new(row?));
    }
    Ok(result)
}

/// Files whose `latestFileMod` entry currently points at `revision`.
pub fn files_pointing_at(
    conn: &rusqlite::Connection,
    revision: &Revision,
) -> Result<Vec<String>, CsetError> {
    let mut stmt =
        conn.prepare_cached("SELECT file FROM latestFileMod WHERE revision = ?1")?;
    let rows = stmt.query_map(params![revision.as_str()], |row| row.get(0))?;
    let mut result = Vec::new();
    for row in rows {
        result.push(row?);
    }
    Ok(result)
}

/// Delete rows whose `revision` is in the retiring set.
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
        let mut stmt = tx.prepare_cached("DELETE FROM latestFileMod WHERE revision = ?1")?;
        for revision in revisions {
            deleted += stmt.execute(params![revision.as_str()])?;
        }
    }
    tx.commit()?;
    Ok(deleted)
}
