//! Checks a context against the fields a template declares as required.
//!
//! Required fields live in the template's `metadata` JSON under `fields`.
//! Metadata that is absent or malformed simply declares nothing.

use crate::db::templates;
use common::model::context::{ContextValue, ReportContext};
use log::warn;
use rusqlite::Connection;

/// Field names declared by `slug`, in metadata order. Empty for unknown slugs.
pub fn required_fields(conn: &Connection, slug: &str) -> rusqlite::Result<Vec<String>> {
    let Some(raw) = templates::find_metadata(conn, slug)? else {
        return Ok(Vec::new());
    };
    Ok(parse_fields(slug, &raw))
}

fn parse_fields(slug: &str, raw: &str) -> Vec<String> {
    let metadata: serde_json::Value = match serde_json::from_str(raw) {
        Ok(metadata) => metadata,
        Err(e) => {
            warn!("Ignoring malformed metadata on template '{}': {}", slug, e);
            return Vec::new();
        }
    };
    match metadata.get("fields") {
        Some(serde_json::Value::Array(fields)) => fields
            .iter()
            .filter_map(|field| field.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// A value counts as missing when absent, null, blank text or an empty collection.
/// Zero and `false` are real values.
pub fn is_missing(value: Option<&ContextValue>) -> bool {
    match value {
        None | Some(ContextValue::Null) => true,
        Some(ContextValue::Text(s)) => s.trim().is_empty(),
        Some(ContextValue::List(items)) => items.is_empty(),
        Some(ContextValue::Record(fields)) => fields.is_empty(),
        Some(_) => false,
    }
}

pub fn missing_fields(required: &[String], context: &ReportContext) -> Vec<String> {
    required
        .iter()
        .filter(|field| is_missing(context.get(field)))
        .cloned()
        .collect()
}

pub fn missing_message(missing: &[String]) -> String {
    format!(
        "Missing values for: {}. Please check your inputs and try again.",
        missing.join(", ")
    )
}

/// `Some(message)` naming every required field `context` lacks, `None` when complete.
pub fn validate(
    conn: &Connection,
    slug: &str,
    context: &ReportContext,
) -> rusqlite::Result<Option<String>> {
    let required = required_fields(conn, slug)?;
    let missing = missing_fields(&required, context);
    if missing.is_empty() {
        Ok(None)
    } else {
        Ok(Some(missing_message(&missing)))
    }
}
