//! The export pipeline
//!
//! select → paginate → render → convert → rasterize → compose
//!
//! Every intermediate file lives in a [`ScratchDir`] owned by the call, so a
//! finished or failed export leaves nothing behind.

use crate::compose::{compose_sheets, rasterize_all, SheetLayout};
use crate::config::{ConfigError, ExportConfig};
use crate::context::RenderContext;
use crate::convert::DocumentConverter;
use crate::error::ExportError;
use crate::model::UserId;
use crate::pagination::paginate;
use crate::raster::Rasterizer;
use crate::selection::{fetch_eligible, parse_ids};
use crate::store::ExpenseStore;
use crate::workspace::ScratchDir;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use template::{Template, TemplateRenderer};
use tracing::{debug, info, info_span, warn};

pub const PDF_MIME: &str = "application/pdf";

/// Download name for an export produced on `date`
pub fn export_filename(date: NaiveDate) -> String {
    format!("reimbursement_{}.pdf", date.format("%Y%m%d"))
}

/// A finished export
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedPdf {
    pub filename: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
    /// Number of A5 forms rendered
    pub forms: usize,
    /// Number of A4 sheets in `bytes`
    pub sheets: usize,
}

/// Row index of a `$.details[i]...` binding
fn detail_index(binding: &str) -> Option<usize> {
    let rest = binding.strip_prefix("$.details[")?;
    let (index, _) = rest.split_once(']')?;
    index.trim().parse().ok()
}

/// The template must bind exactly the rows `0..capacity`
///
/// A missing row would drop a record from the printed table while the
/// total still counts it; an extra row could never be filled.
fn check_detail_rows(template: &Template, capacity: NonZeroUsize) -> Result<(), ConfigError> {
    let bound: BTreeSet<usize> = template.bindings().filter_map(detail_index).collect();

    if let Some(extra) = bound.range(capacity.get()..).next() {
        return Err(ConfigError::Invalid(format!(
            "template binds details[{extra}] but page_capacity is {capacity}"
        )));
    }
    if let Some(missing) = (0..capacity.get()).find(|i| !bound.contains(i)) {
        return Err(ConfigError::Invalid(format!(
            "template has no details[{missing}] row for page_capacity {capacity}"
        )));
    }
    Ok(())
}

pub struct Exporter<S, C, R> {
    store: S,
    converter: C,
    rasterizer: R,
    template: Template,
    config: ExportConfig,
    capacity: NonZeroUsize,
}

impl<S, C, R> Exporter<S, C, R>
where
    S: ExpenseStore,
    C: DocumentConverter,
    R: Rasterizer,
{
    pub fn new(
        store: S,
        converter: C,
        rasterizer: R,
        template: Template,
        config: ExportConfig,
    ) -> Result<Self, ExportError> {
        config.validate()?;
        let capacity = config.page_capacity()?;
        check_detail_rows(&template, capacity)?;
        Ok(Self {
            store,
            converter,
            rasterizer,
            template,
            config,
            capacity,
        })
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    /// Export the records named by `raw_ids` for `user`
    ///
    /// `today` only names the output file.
    pub fn export(&self, user: UserId, raw_ids: &str, today: NaiveDate) -> Result<ExportedPdf, ExportError> {
        let span = info_span!("export", %user);
        let _enter = span.enter();

        let ids = parse_ids(raw_ids)?;
        let name = self
            .store
            .display_name(user)?
            .ok_or(ExportError::UnknownUser(user))?;
        let records = fetch_eligible(&self.store, user, &ids)?;

        let groups = paginate(&records, self.capacity);
        let page_count = groups.len();
        info!(records = records.len(), forms = page_count, "export started");

        let scratch = ScratchDir::create(self.config.scratch_parent.as_deref())?;
        let renderer = TemplateRenderer::new(&self.template);
        let extension = self.template.format().extension();

        let mut documents: Vec<PathBuf> = Vec::with_capacity(page_count);
        for (index, group) in groups.iter().enumerate() {
            let context = RenderContext::build(group, index + 1, page_count, &name);
            let path = scratch.file(&format!("form_{}.{extension}", index + 1));
            renderer.render_to_file(&context, &path)?;
            debug!(form = index + 1, total = %context.total, "form rendered");
            documents.push(path);
        }

        let pdfs = documents
            .iter()
            .map(|doc| {
                self.converter
                    .convert(doc, "pdf", scratch.path(), self.config.convert_timeout())
                    .inspect_err(|e| warn!(document = %doc.display(), error = %e, "conversion failed"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let images = rasterize_all(&self.rasterizer, &pdfs, &self.config.raster_options())?;
        let layout = SheetLayout::a4(self.config.sheet_gap_mm);
        let bytes = compose_sheets(&images, &layout)?;

        let exported = ExportedPdf {
            filename: export_filename(today),
            mime: PDF_MIME,
            bytes,
            forms: page_count,
            sheets: page_count.div_ceil(2),
        };
        info!(
            filename = %exported.filename,
            sheets = exported.sheets,
            bytes = exported.bytes.len(),
            "export finished"
        );
        Ok(exported)
    }
}
