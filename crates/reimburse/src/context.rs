//! Per-form rendering context

use crate::model::ExpenseRecord;
use crate::pagination::PageGroup;
use rmb_text::{format_amount, format_cn_date, format_rmb_upper};
use rust_decimal::Decimal;
use serde::Serialize;

/// One table row on the form; blank rows carry empty strings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetailRow {
    pub desc: String,
    pub category: String,
    pub amount: String,
    pub description: String,
}

impl DetailRow {
    pub fn blank() -> Self {
        Self::default()
    }

    pub fn from_record(record: &ExpenseRecord) -> Self {
        Self {
            desc: record.title.clone(),
            category: record.category.clone().unwrap_or_default(),
            amount: format_amount(record.amount),
            description: record.description.clone().unwrap_or_default(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self == &Self::blank()
    }
}

/// Values bound into the form template, serialized as the template's JSON root
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderContext {
    /// Date of the first record, e.g. 2025年03月01日
    pub date: String,
    /// 1-based position of this form in the export
    pub page_index: usize,
    pub page_count: usize,
    pub details: Vec<DetailRow>,
    pub total: String,
    pub amount_upper: String,
    pub name: String,
    #[serde(skip)]
    pub total_amount: Decimal,
}

impl RenderContext {
    pub fn build(group: &PageGroup, page_index: usize, page_count: usize, name: &str) -> Self {
        let total_amount = group_total(group);

        let details = group
            .rows()
            .map(|row| row.map(DetailRow::from_record).unwrap_or_default())
            .collect();

        Self {
            date: group
                .records()
                .first()
                .map(|r| format_cn_date(r.date))
                .unwrap_or_default(),
            page_index,
            page_count,
            details,
            total: format_amount(total_amount),
            amount_upper: format_rmb_upper(total_amount),
            name: name.to_string(),
            total_amount,
        }
    }
}

/// Exact decimal sum of a group's amounts
pub fn group_total(group: &PageGroup) -> Decimal {
    group.records().iter().map(|r| r.amount).sum()
}
