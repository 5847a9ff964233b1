//! Template document types

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Kind of document a template renders to
///
/// Decides how bound values are escaped and which extension the rendered
/// file carries, so the external converter recognizes it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Flat OpenDocument text (single XML file)
    #[default]
    Fodt,
    /// HTML document
    Html,
    /// Plain text, values inserted verbatim
    Text,
}

impl DocumentFormat {
    /// Infer the format from a file extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "fodt" | "xml" => DocumentFormat::Fodt,
            "html" | "htm" => DocumentFormat::Html,
            _ => DocumentFormat::Text,
        }
    }

    /// Infer the format from a path's extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(DocumentFormat::Text)
    }

    /// File extension of rendered documents
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Fodt => "fodt",
            DocumentFormat::Html => "html",
            DocumentFormat::Text => "txt",
        }
    }

    /// Whether bound values must be XML-escaped
    pub fn escapes_markup(&self) -> bool {
        matches!(self, DocumentFormat::Fodt | DocumentFormat::Html)
    }
}

/// A piece of a parsed template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text copied to the output unchanged
    Literal(String),
    /// A `$.path` binding resolved against the render data
    Binding(String),
}

/// A parsed document template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub(crate) format: DocumentFormat,
    pub(crate) segments: Vec<Segment>,
}

impl Template {
    /// Parse a template source
    ///
    /// # Example
    /// ```
    /// use template::{DocumentFormat, Template};
    ///
    /// let tpl = Template::parse("Total: {{ $.total }}", DocumentFormat::Text).unwrap();
    /// assert_eq!(tpl.bindings().collect::<Vec<_>>(), vec!["$.total"]);
    /// ```
    pub fn parse(source: &str, format: DocumentFormat) -> crate::Result<Self> {
        crate::parser::parse_template(source, format)
    }

    /// Load and parse a template file, inferring the format from its extension
    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| {
            crate::TemplateError::ParseError(format!(
                "Failed to read template {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::parse(&source, DocumentFormat::from_path(path))
    }

    /// Document format
    pub fn format(&self) -> DocumentFormat {
        self.format
    }

    /// Binding paths in source order
    pub fn bindings(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Binding(path) => Some(path.as_str()),
            Segment::Literal(_) => None,
        })
    }
}
