//! The Range Filler (C3): given a start changeset and either a
//! terminal changeset id or a count, appends contiguous ids to the Log
//! Store in the requested direction.

use cset_core::{CsetError, CsetResult, CsetRow, FillBoundary, FillDirection, Revision};
use cset_fetch::ChangelogSource;
use cset_store::CsetStore;

/// Current wall-clock seconds since epoch, used for `stamp = true`
/// inserts (backfill-originated rows that are known to land outside
/// the permanent window).
fn now_secs() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Runs the 9-step fill algorithm and returns the number of newly
/// inserted rows (after the duplicate-revision filter).
pub fn fill(
    fetcher: &dyn ChangelogSource,
    store: &CsetStore,
    parent: FillBoundary,
    child: &str,
    stamp: bool,
    direction: FillDirection,
) -> CsetResult<usize> {
    let forward = direction.is_forward();
    let mut collected: Vec<Revision> = Vec::new();
    let mut cursor = child.to_string();
    let mut found_boundary = false;
    let mut skip_next_backward_entry = !forward;

    loop {
        let page = fetcher.fetch_page(cursor.as_str())?;
        if page.entries.len() < 2 {
            return Err(CsetError::BoundaryAbsent {
                revision: boundary_label(&parent),
                direction: direction.label(),
            });
        }

        let to_iterate = &page.entries[..page.entries.len() - 1];
        for entry in to_iterate {
            if skip_next_backward_entry {
                // The first iterated entry overall is the already-present
                // boundary `child` when filling backward.
                skip_next_backward_entry = false;
                continue;
            }

            if let FillBoundary::Revision(ref p) = parent {
                if entry == p {
                    if !forward {
                        collected.push(entry.clone());
                    }
                    found_boundary = true;
                    break;
                }
            }

            collected.push(entry.clone());

            if let FillBoundary::Count(k) = parent {
                if collected.len() >= k {
                    found_boundary = true;
                    break;
                }
            }
        }

        if found_boundary {
            break;
        }
        cursor = page.next_cursor().expect("checked len >= 2 above").to_string();
    }

    if forward {
        collected.reverse();
    }

    let timestamp = if stamp {
        now_secs()
    } else {
        cset_core::PERMANENT_TIMESTAMP
    };

    let rows = assign_provisional_revnums(store, &collected, direction, timestamp)?;
    let inserted = store.insert_batch_and_compact(&rows)?;
    Ok(inserted)
}

fn boundary_label(parent: &FillBoundary) -> String {
    match parent {
        FillBoundary::Revision(r) => r.to_string(),
        FillBoundary::Count(k) => format!("<count {k}>"),
    }
}

/// Step 6: assign a provisional revnum to each collected row.
///
/// Forward fills continue the current max revnum upward. Backward
/// fills assign descending negative revnums (`0, -1, -2, …`) so that
/// intra-batch order is preserved explicitly ahead of the compact that
/// always follows — relying on the subsequent `compact()` alone, as
/// the source does by reusing the current max revnum per row, would
/// leave the batch's relative order to insertion order rather than an
/// explicit field.
fn assign_provisional_revnums(
    store: &CsetStore,
    collected: &[Revision],
    direction: FillDirection,
    timestamp: i64,
) -> CsetResult<Vec<CsetRow>> {
    if collected.is_empty() {
        return Ok(Vec::new());
    }

    if direction.is_forward() {
        let base = store.tip()?.map(|r| r.revnum).unwrap_or(0);
        Ok(collected
            .iter()
            .enumerate()
            .map(|(i, revision)| CsetRow {
                revnum: base + 1 + i as i64,
                revision: revision.clone(),
                timestamp,
            })
            .collect())
    } else {
        Ok(collected
            .iter()
            .enumerate()
            .map(|(i, revision)| CsetRow {
                revnum: -(i as i64),
                revision: revision.clone(),
                timestamp,
            })
            .collect())
    }
}
