//! Record store collaborator
//!
//! The export pipeline only needs two lookups from persistence: the
//! eligible records for a selection and the requester's display name.
//! [`MemoryStore`] backs both with a JSON dataset for the CLI and tests.

use crate::model::{ExpenseRecord, ExpenseStatus, User, UserId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid dataset: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate expense id {0}")]
    DuplicateRecord(i64),

    #[error("Duplicate user id {0}")]
    DuplicateUser(UserId),
}

/// Filter for [`ExpenseStore::find_records`]
///
/// A record matches when its id is in `ids`, it belongs to `owner` and it
/// is in `status`.
#[derive(Debug, Clone, Copy)]
pub struct RecordQuery<'a> {
    pub owner: UserId,
    pub ids: &'a BTreeSet<i64>,
    pub status: ExpenseStatus,
}

impl RecordQuery<'_> {
    pub fn matches(&self, record: &ExpenseRecord) -> bool {
        record.owner == self.owner && record.status == self.status && self.ids.contains(&record.id)
    }
}

pub trait ExpenseStore {
    /// Records matching the query, in any order
    fn find_records(&self, query: &RecordQuery<'_>) -> Result<Vec<ExpenseRecord>, StoreError>;

    /// Display name of a user, `None` when the user is unknown
    fn display_name(&self, user: UserId) -> Result<Option<String>, StoreError>;
}

/// On-disk shape of a dataset file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub expenses: Vec<ExpenseRecord>,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    users: BTreeMap<UserId, User>,
    expenses: BTreeMap<i64, ExpenseRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_dataset(dataset: Dataset) -> Result<Self, StoreError> {
        let mut store = Self::new();
        for user in dataset.users {
            store.insert_user(user)?;
        }
        for record in dataset.expenses {
            store.insert_expense(record)?;
        }
        Ok(store)
    }

    /// Load a JSON dataset with `users` and `expenses` arrays
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let dataset: Dataset = serde_json::from_str(&content)?;
        Self::from_dataset(dataset)
    }

    pub fn insert_user(&mut self, user: User) -> Result<(), StoreError> {
        if self.users.contains_key(&user.id) {
            return Err(StoreError::DuplicateUser(user.id));
        }
        self.users.insert(user.id, user);
        Ok(())
    }

    pub fn insert_expense(&mut self, record: ExpenseRecord) -> Result<(), StoreError> {
        if self.expenses.contains_key(&record.id) {
            return Err(StoreError::DuplicateRecord(record.id));
        }
        self.expenses.insert(record.id, record);
        Ok(())
    }

    pub fn expense_count(&self) -> usize {
        self.expenses.len()
    }
}

impl ExpenseStore for MemoryStore {
    fn find_records(&self, query: &RecordQuery<'_>) -> Result<Vec<ExpenseRecord>, StoreError> {
        Ok(query
            .ids
            .iter()
            .filter_map(|id| self.expenses.get(id))
            .filter(|record| query.matches(record))
            .cloned()
            .collect())
    }

    fn display_name(&self, user: UserId) -> Result<Option<String>, StoreError> {
        Ok(self.users.get(&user).map(|u| u.realname.clone()))
    }
}
