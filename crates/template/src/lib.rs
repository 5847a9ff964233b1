//! Template Engine - document template parsing and rendering
//!
//! This crate provides:
//! - Document template parsing (`{{ $.path }}` placeholders)
//! - Data binding via JSONPath-like expressions
//! - Markup-aware value escaping (flat ODT, HTML)
//!
//! # Example
//!
//! ```ignore
//! use template::{Template, TemplateRenderer};
//!
//! let template = Template::from_file("assets/expense_a5_template.fodt")?;
//! let data: serde_json::Value = serde_json::from_str(data_json)?;
//! let document = TemplateRenderer::new(&template).render(&data)?;
//! ```

pub mod parser;
mod renderer;
mod schema;

pub use parser::{parse_template, resolve_binding, value_to_string};
pub use renderer::TemplateRenderer;
pub use schema::*;

use thiserror::Error;

/// Errors that can occur during template processing
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to parse template: {0}")]
    ParseError(String),

    #[error("Invalid data binding: {0}")]
    BindingError(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;
