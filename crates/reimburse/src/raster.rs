//! PDF page rasterization

use crate::process::{run_with_timeout, ProcessError};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("No pages rendered from {0}")]
    NoPages(PathBuf),

    #[error("Failed to decode page image {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Invalid rasterizer input {0}")]
    InvalidInput(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterOptions {
    pub dpi: u32,
    /// Output width in pixels; height follows the page aspect ratio
    pub width_px: u32,
    pub timeout: Duration,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            dpi: 300,
            width_px: 595,
            timeout: Duration::from_secs(60),
        }
    }
}

pub trait Rasterizer {
    /// Render every page of `pdf`, in page order
    fn rasterize(&self, pdf: &Path, options: &RasterOptions) -> Result<Vec<DynamicImage>, RasterError>;
}

/// Poppler's `pdftoppm`
#[derive(Debug, Clone)]
pub struct PdftoppmRasterizer {
    program: PathBuf,
}

impl PdftoppmRasterizer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new("pdftoppm")
    }
}

impl Rasterizer for PdftoppmRasterizer {
    fn rasterize(&self, pdf: &Path, options: &RasterOptions) -> Result<Vec<DynamicImage>, RasterError> {
        let dir = pdf
            .parent()
            .ok_or_else(|| RasterError::InvalidInput(pdf.to_path_buf()))?;
        let stem = pdf
            .file_stem()
            .ok_or_else(|| RasterError::InvalidInput(pdf.to_path_buf()))?
            .to_string_lossy();
        let prefix = format!("{stem}-page");

        let mut command = Command::new(&self.program);
        command
            .arg("-png")
            .arg("-r")
            .arg(options.dpi.to_string())
            .arg("-scale-to-x")
            .arg(options.width_px.to_string())
            .arg("-scale-to-y")
            .arg("-1")
            .arg(pdf)
            .arg(dir.join(&prefix));
        run_with_timeout(command, options.timeout)?;

        let pages = page_files(dir, &prefix)?;
        if pages.is_empty() {
            return Err(RasterError::NoPages(pdf.to_path_buf()));
        }
        debug!(pdf = %pdf.display(), pages = pages.len(), "pdf rasterized");

        pages
            .into_iter()
            .map(|path| image::open(&path).map_err(|source| RasterError::Decode { path, source }))
            .collect()
    }
}

/// `<prefix>-<n>.png` files in `dir`, ordered by page number
///
/// pdftoppm zero-pads `n` to the width of the page count, so the number is
/// parsed rather than compared as text.
fn page_files(dir: &Path, prefix: &str) -> Result<Vec<PathBuf>, RasterError> {
    let mut pages = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let page = name
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('-'))
            .and_then(|rest| rest.strip_suffix(".png"))
            .and_then(|n| n.parse::<u32>().ok());
        if let Some(page) = page {
            pages.push((page, path));
        }
    }
    pages.sort_by_key(|(page, _)| *page);
    Ok(pages.into_iter().map(|(_, path)| path).collect())
}
