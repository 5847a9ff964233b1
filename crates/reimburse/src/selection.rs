//! Selection parsing and eligibility checks

use crate::error::{ExportError, SelectionError};
use crate::model::{ExpenseRecord, ExpenseStatus, UserId};
use crate::store::{ExpenseStore, RecordQuery};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Parse a comma-separated id list
///
/// Whitespace around tokens and empty tokens are ignored, repeated ids
/// collapse to one. Any other token rejects the whole selection.
pub fn parse_ids(raw: &str) -> Result<BTreeSet<i64>, SelectionError> {
    let mut ids = BTreeSet::new();

    for token in raw.split(',').map(str::trim) {
        if token.is_empty() {
            continue;
        }
        if !token.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SelectionError::InvalidId(token.to_string()));
        }
        let id = token
            .parse::<i64>()
            .map_err(|_| SelectionError::InvalidId(token.to_string()))?;
        ids.insert(id);
    }

    if ids.is_empty() {
        return Err(SelectionError::Empty);
    }
    Ok(ids)
}

/// Fetch the selected records, all or nothing
///
/// Every id must name an approved record owned by `user`. The result is
/// ordered by date, ties broken by id.
pub fn fetch_eligible<S: ExpenseStore + ?Sized>(
    store: &S,
    user: UserId,
    ids: &BTreeSet<i64>,
) -> Result<Vec<ExpenseRecord>, ExportError> {
    let query = RecordQuery {
        owner: user,
        ids,
        status: ExpenseStatus::Approved,
    };
    let mut records = store.find_records(&query)?;

    if records.len() != ids.len() {
        warn!(
            requested = ids.len(),
            eligible = records.len(),
            "selection contains records that are missing, foreign or not approved"
        );
        return Err(ExportError::UnauthorizedOrMissingRecords {
            requested: ids.len(),
            eligible: records.len(),
        });
    }

    records.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
    debug!(count = records.len(), "selection resolved");
    Ok(records)
}

/// Parse `raw` and fetch the eligible records in one step
pub fn select_records<S: ExpenseStore + ?Sized>(
    store: &S,
    user: UserId,
    raw: &str,
) -> Result<Vec<ExpenseRecord>, ExportError> {
    let ids = parse_ids(raw)?;
    fetch_eligible(store, user, &ids)
}
