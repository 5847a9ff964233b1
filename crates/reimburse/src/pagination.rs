//! Fixed-capacity page groups

use crate::model::ExpenseRecord;
use std::num::NonZeroUsize;

/// Rows per printed form
pub const PAGE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(5) {
    Some(n) => n,
    None => unreachable!(),
};

/// Records printed on one form, plus the blank rows that pad it
#[derive(Debug, Clone, PartialEq)]
pub struct PageGroup {
    records: Vec<ExpenseRecord>,
    capacity: NonZeroUsize,
}

impl PageGroup {
    pub fn records(&self) -> &[ExpenseRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Exactly `capacity` slots: the records in order, then `None` padding
    pub fn rows(&self) -> impl Iterator<Item = Option<&ExpenseRecord>> + '_ {
        self.records
            .iter()
            .map(Some)
            .chain(std::iter::repeat(None))
            .take(self.capacity.get())
    }
}

/// Split ordered records into consecutive groups of at most `capacity`
///
/// Only the last group may be partial. No records yields no groups.
pub fn paginate(records: &[ExpenseRecord], capacity: NonZeroUsize) -> Vec<PageGroup> {
    records
        .chunks(capacity.get())
        .map(|chunk| PageGroup {
            records: chunk.to_vec(),
            capacity,
        })
        .collect()
}
