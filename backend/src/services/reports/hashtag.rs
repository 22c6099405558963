//! # Hashtag Report
//!
//! `POST /api/reports/hashtag` lists the hashtags of one platform and country
//! whose summed views exceed a threshold. The narrative names the top ten; the
//! response carries every hashtag that passed.

use super::{echo, finish, named_views, provided, rejected, run, sql, EchoInputs, ReportError};
use crate::config::AppConfig;
use crate::report_engine::template::thousands;
use crate::report_engine::ReportEngine;
use actix_web::{web, Responder};
use common::model::context::ReportContext;
use common::model::report::{HashtagSummary, ReportResponse};
use common::requests::HashtagReportRequest;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

const TEMPLATE: &str = "hashtag_report";
const LISTED: usize = 10;

pub(crate) async fn process(
    config: web::Data<AppConfig>,
    engine: web::Data<ReportEngine>,
    payload: web::Json<HashtagReportRequest>,
) -> impl Responder {
    let request = payload.into_inner();
    let (Some(platform), Some(country_code), Some(min_views)) = (
        provided(request.platform),
        provided(request.country_code),
        request.min_views.filter(is_given),
    ) else {
        return rejected("Please provide platform, country code and minimum views");
    };
    let Some(min_views) = parse_min_views(&min_views) else {
        return rejected("Minimum views must be an integer");
    };
    run(&config, *engine.get_ref(), move |conn, engine| {
        build(conn, engine, &platform, &country_code, min_views)
    })
    .await
}

/// Null, blank text and zero count as not given.
fn is_given(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::Bool(b) => *b,
        _ => true,
    }
}

/// Accepts an integer, a float (truncated) or a string holding an integer.
fn parse_min_views(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn build(
    conn: &Connection,
    engine: &ReportEngine,
    platform: &str,
    country_code: &str,
    min_views: i64,
) -> Result<ReportResponse<HashtagSummary>, ReportError> {
    let country_id: Option<i64> = conn
        .query_row(&sql(conn, "hashtag_country_check")?, params![country_code], |row| {
            row.get(0)
        })
        .optional()?;
    let Some(country_id) = country_id else {
        return Ok(ReportResponse::failed(format!(
            "Error: No data found for country code '{}'",
            country_code
        )));
    };

    let hashtags = named_views(conn, "hashtag_main", params![platform, country_id, min_views])?;
    if hashtags.is_empty() {
        return Ok(ReportResponse::failed(format!(
            "No hashtags found on {} in {} with total views exceeding {}",
            platform, country_code, min_views
        )));
    }

    let hashtag_list_text = hashtags
        .iter()
        .take(LISTED)
        .map(|h| format!("{} ({} views)", h.name, thousands(h.views)))
        .collect::<Vec<_>>()
        .join(", ");

    let context = ReportContext::new()
        .with("platform", platform)
        .with("country_code", country_code)
        .with("hashtag_count", hashtags.len())
        .with("min_views", min_views)
        .with("hashtag_list_text", hashtag_list_text);

    let summary = HashtagSummary {
        platform: platform.to_string(),
        country_code: country_code.to_string(),
        min_views,
        hashtag_count: hashtags.len(),
        hashtags,
    };
    finish(conn, engine, TEMPLATE, &context, summary)
}

impl EchoInputs for HashtagSummary {
    fn echo_inputs(&self) -> serde_json::Map<String, Value> {
        echo(serde_json::json!({
            "platform": self.platform,
            "country_code": self.country_code,
            "min_views": self.min_views,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::templates::upsert_template;
    use crate::report_engine::emitter::HtmlConverter;
    use crate::services::reports::fixtures;
    use common::model::template::{ReportTemplate, TemplateFormat, TemplateMetadata};
    use serde_json::json;

    fn engine() -> ReportEngine {
        ReportEngine::new(HtmlConverter::Fallback)
    }

    #[test]
    fn lists_hashtags_above_the_threshold() {
        let conn = fixtures::conn();
        let response = build(&conn, &engine(), "TikTok", "US", 500).unwrap();
        let ReportResponse::Rendered { summary, report, .. } = response else {
            panic!("expected a rendered report");
        };
        assert_eq!(summary.hashtag_count, 2);
        assert_eq!(
            report,
            "On TikTok in US, 2 hashtags passed **500** total views.\nTop hashtags: #fun (2,500 views), #dance (1,000 views)."
        );
    }

    #[test]
    fn nothing_above_the_threshold() {
        let conn = fixtures::conn();
        let response = build(&conn, &engine(), "TikTok", "US", 5000).unwrap();
        assert_eq!(
            response.error(),
            Some("No hashtags found on TikTok in US with total views exceeding 5000")
        );
    }

    #[test]
    fn unknown_country() {
        let conn = fixtures::conn();
        let response = build(&conn, &engine(), "TikTok", "ZZ", 1).unwrap();
        assert_eq!(response.error(), Some("Error: No data found for country code 'ZZ'"));
    }

    #[test]
    fn validation_failure_repeats_the_inputs() {
        let conn = fixtures::conn();
        upsert_template(
            &conn,
            &ReportTemplate {
                slug: TEMPLATE.to_string(),
                name: "Hashtags".to_string(),
                format: TemplateFormat::Text,
                content: "{{ sponsor }}".to_string(),
                metadata: TemplateMetadata {
                    fields: vec!["sponsor".to_string()],
                    ..TemplateMetadata::default()
                },
            },
        )
        .unwrap();
        let response = build(&conn, &engine(), "TikTok", "US", 500).unwrap();
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "platform": "TikTok",
                "country_code": "US",
                "min_views": 500,
                "error": "Missing values for: sponsor. Please check your inputs and try again."
            })
        );
    }

    #[test]
    fn min_views_accepts_numbers_and_numeric_strings() {
        assert_eq!(parse_min_views(&json!(1500)), Some(1500));
        assert_eq!(parse_min_views(&json!(" 1500 ")), Some(1500));
        assert_eq!(parse_min_views(&json!(12.9)), Some(12));
        assert_eq!(parse_min_views(&json!("lots")), None);
        assert!(!is_given(&json!(0)));
        assert!(!is_given(&json!("")));
        assert!(is_given(&json!("0")));
    }
}
