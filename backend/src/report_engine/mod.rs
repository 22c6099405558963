//! Validation and rendering of stored report templates.
//!
//! Templates are looked up by slug on every call, so an edit made through the
//! admin endpoints shows up in the very next report.

pub mod emitter;
pub mod error;
pub mod template;
pub mod validator;

use crate::db::templates;
use common::model::context::ReportContext;
use common::model::report::RenderedReport;
use emitter::HtmlConverter;
use error::EngineError;
use log::debug;
use rusqlite::Connection;

/// Shared by every request; holds no per-request state.
#[derive(Debug, Clone, Copy)]
pub struct ReportEngine {
    converter: HtmlConverter,
}

impl ReportEngine {
    pub fn new(converter: HtmlConverter) -> Self {
        ReportEngine { converter }
    }

    pub fn converter(&self) -> HtmlConverter {
        self.converter
    }

    /// `Some(message)` when `context` lacks a field the template requires.
    pub fn validate(
        &self,
        conn: &Connection,
        slug: &str,
        context: &ReportContext,
    ) -> rusqlite::Result<Option<String>> {
        validator::validate(conn, slug, context)
    }

    /// Renders `slug` against `context`. An unknown slug yields the
    /// "Template not found." placeholder rather than an error.
    pub fn render(
        &self,
        conn: &Connection,
        slug: &str,
        context: &ReportContext,
    ) -> Result<RenderedReport, EngineError> {
        let Some(source) = templates::find_render_source(conn, slug)? else {
            debug!("Template '{}' not found", slug);
            return Ok(RenderedReport::not_found());
        };
        let text = template::render_text(&source.content, context)?;
        debug!(
            "Rendered template '{}' ({}, {} bytes)",
            slug,
            source.format.as_str(),
            text.len()
        );
        Ok(emitter::emit(&text, source.format, self.converter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{schema, templates::upsert_template};
    use common::model::context::ContextValue;
    use common::model::template::{ReportTemplate, TemplateFormat, TemplateMetadata};

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        schema::ensure_tables(&conn).unwrap();
        conn
    }

    fn store(conn: &Connection, slug: &str, format: TemplateFormat, content: &str, fields: &[&str]) {
        upsert_template(
            conn,
            &ReportTemplate {
                slug: slug.to_string(),
                name: slug.to_string(),
                format,
                content: content.to_string(),
                metadata: TemplateMetadata {
                    fields: fields.iter().map(|f| f.to_string()).collect(),
                    ..Default::default()
                },
            },
        )
        .unwrap();
    }

    fn engine() -> ReportEngine {
        ReportEngine::new(HtmlConverter::Fallback)
    }

    #[test]
    fn demo_template_validates_and_renders() {
        let conn = conn();
        store(
            &conn,
            "demo",
            TemplateFormat::Text,
            "Views: {{ total_views | format_comma }}",
            &["total_views"],
        );

        let missing = ReportContext::new().with("total_views", ContextValue::Null);
        assert_eq!(
            engine().validate(&conn, "demo", &missing).unwrap().as_deref(),
            Some("Missing values for: total_views. Please check your inputs and try again.")
        );

        let context = ReportContext::new().with("total_views", 2_500_000i64);
        assert_eq!(engine().validate(&conn, "demo", &context).unwrap(), None);
        let report = engine().render(&conn, "demo", &context).unwrap();
        assert_eq!(report.text, "Views: 2,500,000");
        assert_eq!(report.markdown.as_deref(), Some("Views: 2,500,000"));
        assert_eq!(report.html, "<div>Views: 2,500,000</div>");
    }

    #[test]
    fn unknown_slug_renders_the_placeholder() {
        let report = engine()
            .render(&conn(), "nonexistent_slug", &ReportContext::new())
            .unwrap();
        assert_eq!(report, RenderedReport::not_found());
        assert_eq!(report.text, "Template not found.");
        assert_eq!(report.html, "<p>Template not found.</p>");
    }

    #[test]
    fn html_templates_highlight_strong_values() {
        let conn = conn();
        store(&conn, "html", TemplateFormat::Html, "<strong>{{ n }}</strong> views", &[]);
        let report = engine()
            .render(&conn, "html", &ReportContext::new().with("n", 42i64))
            .unwrap();
        assert_eq!(report.html, r#"<span class="highlight-data">42</span> views"#);
        assert_eq!(report.markdown, None);
        assert_eq!(report.text, r#"<span class="highlight-data">42</span> views"#);
    }

    #[test]
    fn edits_are_visible_on_the_next_render() {
        let conn = conn();
        store(&conn, "live", TemplateFormat::Text, "v1", &[]);
        assert_eq!(engine().render(&conn, "live", &ReportContext::new()).unwrap().text, "v1");
        store(&conn, "live", TemplateFormat::Markdown, "**v2**", &[]);
        let report = engine().render(&conn, "live", &ReportContext::new()).unwrap();
        assert_eq!(report.text, "**v2**");
        assert_eq!(report.html, r#"<div><span class="highlight-data">v2</span></div>"#);
    }

    #[test]
    fn template_errors_propagate() {
        let conn = conn();
        store(&conn, "broken", TemplateFormat::Text, "{% if %}", &[]);
        let err = engine()
            .render(&conn, "broken", &ReportContext::new())
            .unwrap_err();
        assert!(matches!(err, EngineError::Template(_)));
    }
}
