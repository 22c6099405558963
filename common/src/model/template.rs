use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Source format a report template is authored in.
///
/// The format decides how the rendered base text is turned into the
/// `text` / `markdown` / `html` trio returned to the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemplateFormat {
    Text,
    Markdown,
    Html,
}

impl TemplateFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateFormat::Text => "text",
            TemplateFormat::Markdown => "markdown",
            TemplateFormat::Html => "html",
        }
    }

    /// Parses the value stored in the `format` column. Unknown values yield `None`.
    pub fn from_db(value: &str) -> Option<Self> {
        match value.trim() {
            "text" => Some(TemplateFormat::Text),
            "markdown" => Some(TemplateFormat::Markdown),
            "html" => Some(TemplateFormat::Html),
            _ => None,
        }
    }
}

/// JSON metadata attached to a template row.
///
/// `fields` lists the context keys a caller must supply. Any other keys are kept
/// verbatim so that round-tripping a template through the admin API is lossless.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateMetadata {
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A report template as stored in `report_templates`, keyed by `slug`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportTemplate {
    pub slug: String,
    pub name: String,
    pub format: TemplateFormat,
    pub content: String,
    #[serde(default)]
    pub metadata: TemplateMetadata,
}

/// A parameterized SQL aggregation stored in `report_queries`, keyed by `slug`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportQuery {
    pub slug: String,
    pub sql_text: String,
    #[serde(default)]
    pub description: Option<String>,
}
