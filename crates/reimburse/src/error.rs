//! Export error taxonomy

use crate::compose::ComposeError;
use crate::config::ConfigError;
use crate::convert::ConvertError;
use crate::model::UserId;
use crate::store::StoreError;
use template::TemplateError;
use thiserror::Error;

/// Why a raw selection string was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("'{0}' is not a record id")]
    InvalidId(String),

    #[error("no records selected")]
    Empty,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Invalid parameters: {0}")]
    InvalidSelection(#[from] SelectionError),

    #[error("Unknown user {0}")]
    UnknownUser(UserId),

    #[error(
        "Unauthorized or invalid records: {eligible} of {requested} selected records are \
         approved and owned by the requester"
    )]
    UnauthorizedOrMissingRecords { requested: usize, eligible: usize },

    #[error("Template rendering failed: {0}")]
    Template(#[from] TemplateError),

    #[error("Document conversion failed: {0}")]
    Conversion(#[from] ConvertError),

    #[error("Sheet composition failed: {0}")]
    Composition(#[from] ComposeError),

    #[error("Record store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Scratch space error: {0}")]
    Io(#[from] std::io::Error),
}

impl ExportError {
    /// Whether the caller caused the failure, as opposed to the system
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            ExportError::InvalidSelection(_)
                | ExportError::UnknownUser(_)
                | ExportError::UnauthorizedOrMissingRecords { .. }
        )
    }
}
