//! Two-up composition of form images onto A4 sheets
//!
//! Coordinates are in points with the origin at the sheet's top-left. The
//! first form of a pair sits directly above the sheet's midline (minus half
//! the gap), the second sits on the bottom edge. Both are left-aligned and
//! scaled uniformly to fit half the sheet.

use crate::raster::{RasterError, RasterOptions, Rasterizer};
use image::DynamicImage;
use pdf_core::{fit_box_scale, PageSize, PdfDocument, PdfError, POINTS_PER_MM};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("Rasterization failed: {0}")]
    Raster(#[from] RasterError),

    #[error("PDF assembly failed: {0}")]
    Pdf(#[from] PdfError),

    #[error("{0} rendered no pages")]
    EmptyRaster(PathBuf),

    #[error("Form image {0} has zero size")]
    ZeroSized(usize),

    #[error("Nothing to compose")]
    Empty,
}

/// Sheet geometry in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SheetLayout {
    pub width: f64,
    pub height: f64,
    /// Vertical gap between the two halves
    pub gap: f64,
}

impl SheetLayout {
    /// A4 portrait with a gap given in millimetres
    pub fn a4(gap_mm: f64) -> Self {
        Self {
            width: PageSize::A4.width,
            height: PageSize::A4.height,
            gap: gap_mm * POINTS_PER_MM,
        }
    }

    /// Height available to each half
    pub fn half_height(&self) -> f64 {
        (self.height - self.gap) / 2.0
    }

    /// Uniform scale fitting a `width x height` image into one half
    pub fn fit_scale(&self, width: u32, height: u32) -> f64 {
        fit_box_scale(width, height, self.width, self.half_height())
    }

    pub fn page_size(&self) -> PageSize {
        PageSize::new(self.width, self.height)
    }

    /// Placement of the first form of a pair
    pub fn place_top(&self, width: u32, height: u32) -> Placement {
        let scaled = self.scaled(width, height);
        Placement {
            y: self.height / 2.0 - self.gap / 2.0 - scaled.height,
            ..scaled
        }
    }

    /// Placement of the second form of a pair
    pub fn place_bottom(&self, width: u32, height: u32) -> Placement {
        let scaled = self.scaled(width, height);
        Placement {
            y: self.height - scaled.height,
            ..scaled
        }
    }

    fn scaled(&self, width: u32, height: u32) -> Placement {
        let scale = self.fit_scale(width, height);
        Placement {
            x: 0.0,
            y: 0.0,
            width: width as f64 * scale,
            height: height as f64 * scale,
        }
    }
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self::a4(1.0)
    }
}

/// Where an image lands on a sheet, top-left origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Placement {
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// One output sheet; `bottom` is `None` for an odd trailing form
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComposedSheet {
    pub top: Placement,
    pub bottom: Option<Placement>,
}

/// Plan sheets for images of the given pixel sizes, paired in order
pub fn plan_sheets(layout: &SheetLayout, sizes: &[(u32, u32)]) -> Vec<ComposedSheet> {
    sizes
        .chunks(2)
        .map(|pair| ComposedSheet {
            top: layout.place_top(pair[0].0, pair[0].1),
            bottom: pair.get(1).map(|&(w, h)| layout.place_bottom(w, h)),
        })
        .collect()
}

/// Render the first page of each PDF, in order
pub fn rasterize_all<R: Rasterizer + ?Sized>(
    rasterizer: &R,
    pdfs: &[PathBuf],
    options: &RasterOptions,
) -> Result<Vec<DynamicImage>, ComposeError> {
    pdfs.iter()
        .map(|pdf| first_page(rasterizer, pdf, options))
        .collect()
}

fn first_page<R: Rasterizer + ?Sized>(
    rasterizer: &R,
    pdf: &Path,
    options: &RasterOptions,
) -> Result<DynamicImage, ComposeError> {
    rasterizer
        .rasterize(pdf, options)?
        .into_iter()
        .next()
        .ok_or_else(|| ComposeError::EmptyRaster(pdf.to_path_buf()))
}

/// Lay images out two per sheet and serialize the result
pub fn compose_sheets(images: &[DynamicImage], layout: &SheetLayout) -> Result<Vec<u8>, ComposeError> {
    if images.is_empty() {
        return Err(ComposeError::Empty);
    }
    if let Some(index) = images.iter().position(|i| i.width() == 0 || i.height() == 0) {
        return Err(ComposeError::ZeroSized(index));
    }

    let sizes: Vec<(u32, u32)> = images.iter().map(|i| (i.width(), i.height())).collect();
    let sheets = plan_sheets(layout, &sizes);

    let mut doc = PdfDocument::new();
    for (sheet, pair) in sheets.iter().zip(images.chunks(2)) {
        let page = doc.add_blank_page(layout.page_size())?;
        draw(&mut doc, page, &pair[0], &sheet.top)?;
        if let (Some(placement), Some(image)) = (&sheet.bottom, pair.get(1)) {
            draw(&mut doc, page, image, placement)?;
        }
    }
    debug!(forms = images.len(), sheets = sheets.len(), "sheets composed");

    Ok(doc.to_bytes()?)
}

fn draw(
    doc: &mut PdfDocument,
    page: usize,
    image: &DynamicImage,
    placement: &Placement,
) -> Result<(), PdfError> {
    doc.insert_image(
        image,
        page,
        placement.x,
        placement.y,
        placement.width,
        placement.height,
    )
}
