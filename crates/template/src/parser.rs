//! Template source parsing and data binding

use crate::{DocumentFormat, Result, Segment, Template, TemplateError};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Parse a template source into literal and binding segments
///
/// Bindings are written `{{ $.path }}`; whitespace inside the braces is ignored.
pub fn parse_template(source: &str, format: DocumentFormat) -> Result<Template> {
    let mut segments = Vec::new();
    let mut rest = source;
    let mut offset = 0;

    while let Some(start) = rest.find(OPEN) {
        if start > 0 {
            segments.push(Segment::Literal(rest[..start].to_string()));
        }

        let after = &rest[start + OPEN.len()..];
        let end = after.find(CLOSE).ok_or_else(|| {
            TemplateError::ParseError(format!("Unterminated binding at byte {}", offset + start))
        })?;

        let path = after[..end].trim();
        validate_path(path).map_err(|reason| {
            TemplateError::ParseError(format!(
                "Invalid binding '{}' at byte {}: {}",
                path,
                offset + start,
                reason
            ))
        })?;
        segments.push(Segment::Binding(path.to_string()));

        let consumed = start + OPEN.len() + end + CLOSE.len();
        offset += consumed;
        rest = &rest[consumed..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Literal(rest.to_string()));
    }

    Ok(Template { format, segments })
}

/// Check a binding path against the supported JSONPath subset
fn validate_path(path: &str) -> std::result::Result<(), &'static str> {
    let body = path.strip_prefix("$.").ok_or("must start with '$.'")?;
    if body.is_empty() {
        return Err("empty path");
    }

    for segment in body.split('.') {
        let (field, index) = split_index(segment).ok_or("malformed array index")?;
        if field.is_empty() && index.is_none() {
            return Err("empty path segment");
        }
        if !field
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        {
            return Err("unexpected character in field name");
        }
    }

    Ok(())
}

/// Split `field[3]` into `("field", Some(3))`; `field` into `("field", None)`
fn split_index(segment: &str) -> Option<(&str, Option<usize>)> {
    match segment.find('[') {
        None => Some((segment, None)),
        Some(bracket_pos) => {
            let index_str = segment[bracket_pos + 1..].strip_suffix(']')?;
            let index = index_str.parse().ok()?;
            Some((&segment[..bracket_pos], Some(index)))
        }
    }
}

/// Resolve a JSONPath-like binding expression against data
///
/// Supports simple paths like:
/// - `$.field` - Root field
/// - `$.object.field` - Nested field
/// - `$.array[0]` - Array index
/// - `$.array[0].field` - Array element field
pub fn resolve_binding<'a>(
    path: &str,
    data: &'a serde_json::Value,
) -> Option<&'a serde_json::Value> {
    let path = path.strip_prefix("$.")?;
    let mut current = data;

    for segment in path.split('.') {
        let (field, index) = split_index(segment)?;
        if !field.is_empty() {
            current = current.get(field)?;
        }
        if let Some(index) = index {
            current = current.get(index)?;
        }
    }

    Some(current)
}

/// Convert a JSON value to string for rendering
pub fn value_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Null => String::new(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => value.to_string(),
    }
}
