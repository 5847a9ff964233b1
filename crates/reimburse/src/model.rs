//! Expense records and users as the export pipeline sees them

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Opaque user identifier handed over by the authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl Display for UserId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Approval state of an expense record
///
/// Datasets may spell states in English or with the labels used by the
/// approval workflow (待审批 / 通过审批 / 驳回).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseStatus {
    #[default]
    #[serde(alias = "待审批")]
    Pending,
    #[serde(alias = "通过审批")]
    Approved,
    #[serde(alias = "驳回")]
    Rejected,
}

/// One expense line item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: i64,
    pub date: NaiveDate,
    pub title: String,
    /// Expense type name, e.g. 交通 or 住宿
    #[serde(default)]
    pub category: Option<String>,
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: ExpenseStatus,
    #[serde(alias = "submitter_id")]
    pub owner: UserId,
}

/// A user known to the record store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Display name printed on the form
    pub realname: String,
}
