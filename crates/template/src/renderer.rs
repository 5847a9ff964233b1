//! Template rendering

use crate::parser::{resolve_binding, value_to_string};
use crate::schema::*;
use crate::{Result, TemplateError};
use serde::Serialize;
use std::path::Path;

/// Template renderer
pub struct TemplateRenderer<'a> {
    /// The template to render
    template: &'a Template,
}

impl<'a> TemplateRenderer<'a> {
    /// Create a new renderer for a template
    pub fn new(template: &'a Template) -> Self {
        Self { template }
    }

    /// Render the template with data
    ///
    /// Every binding must resolve; a missing field is a `BindingError` rather
    /// than an empty string.
    ///
    /// # Arguments
    /// * `data` - Data for binding
    pub fn render(&self, data: &serde_json::Value) -> Result<String> {
        let mut output = String::new();
        let escape = self.template.format.escapes_markup();

        for segment in &self.template.segments {
            match segment {
                Segment::Literal(text) => output.push_str(text),
                Segment::Binding(path) => {
                    let value = resolve_binding(path, data).ok_or_else(|| {
                        TemplateError::BindingError(format!("No value for '{path}'"))
                    })?;
                    let text = value_to_string(value);
                    if escape {
                        push_escaped(&mut output, &text);
                    } else {
                        output.push_str(&text);
                    }
                }
            }
        }

        Ok(output)
    }

    /// Render the template with any serializable context
    pub fn render_serializable<T: Serialize>(&self, context: &T) -> Result<String> {
        let data = serde_json::to_value(context)?;
        self.render(&data)
    }

    /// Render the template and write the document to `path`
    pub fn render_to_file<T: Serialize, P: AsRef<Path>>(&self, context: &T, path: P) -> Result<()> {
        let document = self.render_serializable(context)?;
        std::fs::write(path, document)?;
        Ok(())
    }
}

/// Append `text` with XML special characters escaped
fn push_escaped(output: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&apos;"),
            _ => output.push(c),
        }
    }
}
