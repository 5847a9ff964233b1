//! Reimbursement form export
//!
//! Turns a user's selection of approved expense records into a single PDF:
//! records are grouped five to a form, each form is rendered from a template
//! and converted to PDF by an external converter, then every form page is
//! rasterized and placed two per A4 sheet.
//!
//! # Example
//!
//! ```ignore
//! use reimburse::{ExportConfig, Exporter, MemoryStore, PdftoppmRasterizer, SofficeConverter, UserId};
//! use template::Template;
//!
//! let config = ExportConfig::default();
//! let exporter = Exporter::new(
//!     MemoryStore::load("dataset.json")?,
//!     SofficeConverter::new(&config.soffice),
//!     PdftoppmRasterizer::new(&config.pdftoppm),
//!     Template::from_file(&config.template)?,
//!     config,
//! )?;
//! let pdf = exporter.export(UserId(1), "3,1,2", chrono::Local::now().date_naive())?;
//! std::fs::write(&pdf.filename, &pdf.bytes)?;
//! ```

pub mod args;
pub mod compose;
pub mod config;
pub mod context;
pub mod convert;
pub mod error;
pub mod export;
pub mod model;
pub mod pagination;
pub mod process;
pub mod raster;
pub mod selection;
pub mod store;
pub mod workspace;

pub use compose::{ComposeError, ComposedSheet, Placement, SheetLayout};
pub use config::{ConfigError, ExportConfig};
pub use context::{DetailRow, RenderContext};
pub use convert::{ConvertError, DocumentConverter, SofficeConverter};
pub use error::{ExportError, SelectionError};
pub use export::{export_filename, ExportedPdf, Exporter, PDF_MIME};
pub use model::{ExpenseRecord, ExpenseStatus, User, UserId};
pub use pagination::{paginate, PageGroup, PAGE_CAPACITY};
pub use raster::{PdftoppmRasterizer, RasterError, RasterOptions, Rasterizer};
pub use store::{Dataset, ExpenseStore, MemoryStore, RecordQuery, StoreError};

/// Result type for export operations
pub type Result<T> = std::result::Result<T, ExportError>;
