use common::model::template::{ReportTemplate, TemplateFormat, TemplateMetadata};
use log::warn;
use rusqlite::{params, Connection, OptionalExtension};

/// Format and body of a template, everything needed to render it.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSource {
    pub format: TemplateFormat,
    pub content: String,
}

/// Looks up the current format and content for `slug`. Nothing is cached, so
/// edits to the row are visible to the very next render.
pub fn find_render_source(conn: &Connection, slug: &str) -> rusqlite::Result<Option<RenderSource>> {
    conn.query_row(
        "SELECT format, content FROM report_templates WHERE slug = ?1",
        params![slug],
        |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
    )
    .optional()
    .map(|found| {
        found.map(|(format, content)| RenderSource {
            format: format_or_text(slug, &format),
            content,
        })
    })
}

/// Raw `metadata` column for `slug`. `None` when the template is unknown or has no metadata.
pub fn find_metadata(conn: &Connection, slug: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT metadata FROM report_templates WHERE slug = ?1",
        params![slug],
        |row| row.get::<_, Option<String>>(0),
    )
    .optional()
    .map(Option::flatten)
}

pub fn find_template(conn: &Connection, slug: &str) -> rusqlite::Result<Option<ReportTemplate>> {
    conn.query_row(
        "SELECT slug, name, format, content, metadata FROM report_templates WHERE slug = ?1",
        params![slug],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        },
    )
    .optional()
    .map(|found| {
        found.map(|(slug, name, format, content, metadata)| ReportTemplate {
            format: format_or_text(&slug, &format),
            metadata: metadata
                .and_then(|m| serde_json::from_str::<TemplateMetadata>(&m).ok())
                .unwrap_or_default(),
            slug,
            name,
            content,
        })
    })
}

/// Creates or replaces the template stored under `template.slug`.
pub fn upsert_template(conn: &Connection, template: &ReportTemplate) -> rusqlite::Result<()> {
    let metadata = metadata_json(&template.metadata);
    conn.execute(
        "INSERT INTO report_templates (slug, name, format, content, metadata)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(slug) DO UPDATE SET
             name = excluded.name,
             format = excluded.format,
             content = excluded.content,
             metadata = excluded.metadata,
             updated_at = CURRENT_TIMESTAMP",
        params![
            &template.slug,
            &template.name,
            template.format.as_str(),
            &template.content,
            metadata
        ],
    )?;
    Ok(())
}

/// Stores `template` only if its slug is free. Returns whether a row was inserted.
pub fn insert_template_if_missing(
    conn: &Connection,
    template: &ReportTemplate,
) -> rusqlite::Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO report_templates (slug, name, format, content, metadata)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            &template.slug,
            &template.name,
            template.format.as_str(),
            &template.content,
            metadata_json(&template.metadata)
        ],
    )?;
    Ok(inserted > 0)
}

fn metadata_json(metadata: &TemplateMetadata) -> String {
    serde_json::to_string(metadata).unwrap_or_else(|_| "{}".to_string())
}

fn format_or_text(slug: &str, format: &str) -> TemplateFormat {
    TemplateFormat::from_db(format).unwrap_or_else(|| {
        warn!("Template '{}' has unknown format '{}', treating it as text", slug, format);
        TemplateFormat::Text
    })
}
