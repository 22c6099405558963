//! Turns rendered template text into the plain text, Markdown and HTML trio.
//!
//! Bold markup (`<strong>`, `<b>`, `**x**`) always ends up as
//! `<span class="highlight-data">x</span>` in the HTML output so the dashboard
//! can style highlighted figures the same way for every template format.

use common::model::report::RenderedReport;
use common::model::template::TemplateFormat;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const SPAN_OPEN: &str = r#"<span class="highlight-data">"#;
const SPAN_CLOSE: &str = "</span>";

static STRONG_WITH_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<strong\s+class="[^"]*">([^<]+)</strong>"#).expect("valid regex"));
static STRONG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<strong>([^<]+)</strong>").expect("valid regex"));
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"<b>([^<]+)</b>").expect("valid regex"));
static MARKDOWN_BOLD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").expect("valid regex"));
static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[A-Za-z][A-Za-z0-9]{1,7});").expect("valid regex")
});

/// How Markdown/plain-text reports get their HTML form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HtmlConverter {
    /// Full Markdown rendering; single newlines become `<br />`.
    #[cfg(feature = "markdown")]
    Markdown,
    /// Highlights bold spans, escapes everything else and wraps it in a `<div>`.
    Fallback,
}

impl HtmlConverter {
    /// The Markdown converter when compiled in and enabled, otherwise the fallback.
    pub fn select(markdown_enabled: bool) -> Self {
        #[cfg(feature = "markdown")]
        if markdown_enabled {
            return HtmlConverter::Markdown;
        }
        #[cfg(not(feature = "markdown"))]
        let _ = markdown_enabled;
        HtmlConverter::Fallback
    }

    pub fn to_html(self, text: &str) -> String {
        match self {
            #[cfg(feature = "markdown")]
            HtmlConverter::Markdown => normalize_highlights(&markdown_to_html(text)),
            HtmlConverter::Fallback => fallback_html(text),
        }
    }
}

pub fn emit(base: &str, format: TemplateFormat, converter: HtmlConverter) -> RenderedReport {
    match format {
        TemplateFormat::Html => {
            let html = normalize_highlights(base);
            RenderedReport {
                text: unescape_html(&html),
                markdown: None,
                html,
            }
        }
        TemplateFormat::Markdown | TemplateFormat::Text => RenderedReport {
            text: base.to_string(),
            markdown: Some(base.to_string()),
            html: converter.to_html(base),
        },
    }
}

/// Rewrites every bold form into a highlight span. Applying it twice changes nothing.
pub fn normalize_highlights(html: &str) -> String {
    let html = STRONG_WITH_CLASS.replace_all(html, highlight);
    let html = STRONG.replace_all(&html, highlight);
    let html = BOLD.replace_all(&html, highlight);
    MARKDOWN_BOLD
        .replace_all(&html, |caps: &Captures| {
            let inner = caps[1].trim();
            if inner.is_empty() {
                caps[0].to_string()
            } else {
                format!("{}{}{}", SPAN_OPEN, inner, SPAN_CLOSE)
            }
        })
        .into_owned()
}

fn highlight(caps: &Captures) -> String {
    format!("{}{}{}", SPAN_OPEN, &caps[1], SPAN_CLOSE)
}

fn fallback_html(text: &str) -> String {
    let escaped = escape_html(&normalize_highlights(text));
    let restored = escaped
        .replace(&escape_html(SPAN_OPEN), SPAN_OPEN)
        .replace(&escape_html(SPAN_CLOSE), SPAN_CLOSE);
    format!("<div>{}</div>", restored)
}

#[cfg(feature = "markdown")]
fn markdown_to_html(text: &str) -> String {
    use pulldown_cmark::{html, Event, Parser};

    let parser = Parser::new(text).map(|event| match event {
        Event::SoftBreak => Event::HardBreak,
        other => other,
    });
    let mut html_output = String::new();
    html::push_html(&mut html_output, parser);
    html_output.trim_end().to_string()
}

/// Escapes `&`, `<`, `>`, `"` and `'`.
pub fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Decodes numeric character references and the common named entities.
/// Unknown entities are left as written.
pub fn unescape_html(input: &str) -> String {
    ENTITY
        .replace_all(input, |caps: &Captures| {
            decode_entity(&caps[1]).map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

fn decode_entity(entity: &str) -> Option<char> {
    if let Some(number) = entity.strip_prefix('#') {
        let code = match number.strip_prefix(&['x', 'X'][..]) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse().ok()?,
        };
        return char::from_u32(code).or(Some('\u{FFFD}'));
    }
    Some(match entity {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        "trade" => '\u{2122}',
        "hellip" => '\u{2026}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201c}',
        "rdquo" => '\u{201d}',
        "bull" => '\u{2022}',
        "middot" => '\u{b7}',
        "euro" => '\u{20ac}',
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_bold_form_becomes_a_highlight() {
        assert_eq!(
            normalize_highlights(r#"<strong>1</strong> <strong class="x">2</strong> <b>3</b> ** 4 **"#),
            r#"<span class="highlight-data">1</span> <span class="highlight-data">2</span> <span class="highlight-data">3</span> <span class="highlight-data">4</span>"#
        );
    }

    #[test]
    fn blank_markdown_bold_is_left_alone() {
        assert_eq!(normalize_highlights("a **  ** b"), "a **  ** b");
    }

    #[test]
    fn normalization_is_idempotent() {
        let once = normalize_highlights("**100** users and <strong>42</strong> <b>views</b>");
        assert_eq!(normalize_highlights(&once), once);
    }

    #[test]
    fn html_templates_keep_their_markup() {
        let report = emit("<strong>42</strong> views &amp; more", TemplateFormat::Html, HtmlConverter::Fallback);
        assert_eq!(report.html, r#"<span class="highlight-data">42</span> views &amp; more"#);
        assert_eq!(report.markdown, None);
        assert_eq!(report.text, unescape_html(&report.html));
        assert_eq!(report.text, r#"<span class="highlight-data">42</span> views & more"#);
    }

    #[test]
    fn fallback_escapes_everything_but_highlights() {
        let report = emit("**100** users <script>", TemplateFormat::Markdown, HtmlConverter::Fallback);
        assert_eq!(
            report.html,
            r#"<div><span class="highlight-data">100</span> users &lt;script&gt;</div>"#
        );
        assert_eq!(report.markdown.as_deref(), Some("**100** users <script>"));
        assert_eq!(report.text, "**100** users <script>");
    }

    #[test]
    fn text_templates_get_markdown_too() {
        let report = emit("plain", TemplateFormat::Text, HtmlConverter::Fallback);
        assert_eq!(report.markdown.as_deref(), Some("plain"));
        assert_eq!(report.html, "<div>plain</div>");
    }

    #[cfg(feature = "markdown")]
    #[test]
    fn markdown_converter_keeps_line_breaks() {
        let html = HtmlConverter::Markdown.to_html("**100** users\nsecond line");
        assert_eq!(
            html,
            "<p><span class=\"highlight-data\">100</span> users<br />\nsecond line</p>"
        );
    }

    #[test]
    fn converter_selection_honours_the_switch() {
        assert_eq!(HtmlConverter::select(false), HtmlConverter::Fallback);
        #[cfg(feature = "markdown")]
        assert_eq!(HtmlConverter::select(true), HtmlConverter::Markdown);
    }

    #[test]
    fn entities_round_trip() {
        let raw = r#"<a href="x">Tom & Jerry's</a>"#;
        assert_eq!(unescape_html(&escape_html(raw)), raw);
        assert_eq!(unescape_html("&#8364; &euro; &bogus;"), "\u{20ac} \u{20ac} &bogus;");
    }
}
