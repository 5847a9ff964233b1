//! PDF Core - Low-level PDF assembly
//!
//! This crate provides functionality for:
//! - Creating PDF documents with blank pages of a given size
//! - Embedding raster images as XObjects
//! - Placing images into boxes given in top-left page coordinates
//! - Serializing the result to bytes
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{PageSize, PdfDocument};
//!
//! let mut doc = PdfDocument::new();
//! let page = doc.add_blank_page(PageSize::A4)?;
//! doc.insert_image(&bitmap, page, 0.0, 0.0, 595.28, 420.0)?;
//! let bytes = doc.to_bytes()?;
//! ```

mod document;
mod image;

pub use document::{PageSize, PdfDocument};
pub use image::{fit_box_scale, ImageXObject};

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to open PDF: {0}")]
    OpenError(String),

    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("Invalid page number: {0} (document has {1} pages)")]
    InvalidPage(usize, usize),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("PDF parsing error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Lopdf error: {0}")]
    LopdfError(#[from] lopdf::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// Points per millimetre
pub const POINTS_PER_MM: f64 = 72.0 / 25.4;
