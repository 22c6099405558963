//! # Global Analysis Report
//!
//! `POST /api/reports/global-analysis` summarizes one platform for one month:
//! content volume, views, mean engagement, the five countries with the most
//! views, the most viewed hashtag and the category distribution.

use super::{echo, finish, named_views, provided, rejected, run, sql, EchoInputs, ReportError};
use crate::config::AppConfig;
use crate::report_engine::template::thousands;
use crate::report_engine::ReportEngine;
use actix_web::{web, Responder};
use common::model::context::ReportContext;
use common::model::report::{GlobalAnalysisSummary, ReportResponse};
use common::requests::GlobalAnalysisRequest;
use rusqlite::{params, Connection};

const TEMPLATE: &str = "global_analysis";

pub(crate) async fn process(
    config: web::Data<AppConfig>,
    engine: web::Data<ReportEngine>,
    payload: web::Json<GlobalAnalysisRequest>,
) -> impl Responder {
    let request = payload.into_inner();
    let (Some(platform), Some(year_month)) = (provided(request.platform), provided(request.year_month))
    else {
        return rejected("Please provide platform and year_month");
    };
    run(&config, *engine.get_ref(), move |conn, engine| {
        build(conn, engine, &platform, &year_month)
    })
    .await
}

pub(crate) fn build(
    conn: &Connection,
    engine: &ReportEngine,
    platform: &str,
    year_month: &str,
) -> Result<ReportResponse<GlobalAnalysisSummary>, ReportError> {
    let (total_content, total_views, avg_engagement) = conn.query_row(
        &sql(conn, "global_summary")?,
        params![platform, year_month],
        |row| {
            Ok((
                row.get::<_, Option<i64>>(0)?.unwrap_or(0),
                row.get::<_, Option<i64>>(1)?.unwrap_or(0),
                row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
            ))
        },
    )?;
    if total_content == 0 {
        return Ok(ReportResponse::failed(format!(
            "No data found for {} in {}",
            platform, year_month
        )));
    }

    let top_countries = named_views(conn, "global_top_countries", params![platform, year_month])?;
    let top_hashtag = named_views(conn, "global_top_hashtag", params![platform, year_month])?
        .into_iter()
        .next()
        .map(|h| h.name)
        .unwrap_or_else(|| "N/A".to_string());
    let categories = named_views(conn, "global_category_dist", params![platform, year_month])?;

    let (top_country, top_country_views) = top_countries
        .first()
        .map(|c| (c.name.clone(), c.views))
        .unwrap_or_else(|| ("N/A".to_string(), 0));
    let top_country_pct = if total_views > 0 {
        top_country_views as f64 / total_views as f64 * 100.0
    } else {
        0.0
    };
    let country_list_text = top_countries
        .iter()
        .map(|c| format!("{} ({} views)", c.name, thousands(c.views)))
        .collect::<Vec<_>>()
        .join(", ");

    let context = ReportContext::new()
        .with("platform", platform)
        .with("year_month", year_month)
        .with("country_list_text", country_list_text)
        .with("total_views", total_views)
        .with("total_content", total_content)
        .with("avg_engagement", avg_engagement)
        .with("top_country", top_country.as_str())
        .with("top_country_views", top_country_views)
        .with("top_country_pct", top_country_pct)
        .with("top_hashtag", top_hashtag.as_str());

    let summary = GlobalAnalysisSummary {
        platform: platform.to_string(),
        year_month: year_month.to_string(),
        title: format!("{} {} Country Distribution", year_month, platform),
        total_content,
        total_views,
        avg_engagement,
        top_hashtag,
        top_country,
        top_countries,
        categories,
    };
    finish(conn, engine, TEMPLATE, &context, summary)
}

impl EchoInputs for GlobalAnalysisSummary {
    fn echo_inputs(&self) -> serde_json::Map<String, serde_json::Value> {
        echo(serde_json::json!({
            "platform": self.platform,
            "year_month": self.year_month,
            "top_countries": self.top_countries,
            "categories": self.categories,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report_engine::emitter::HtmlConverter;
    use crate::services::reports::fixtures;
    use common::model::report::NamedViews;

    fn engine() -> ReportEngine {
        ReportEngine::new(HtmlConverter::Fallback)
    }

    #[test]
    fn summarizes_a_month() {
        let conn = fixtures::conn();
        let response = build(&conn, &engine(), "TikTok", "2025-01").unwrap();
        let ReportResponse::Rendered { summary, report, report_markdown, .. } = response else {
            panic!("expected a rendered report");
        };
        assert_eq!(summary.total_content, 3);
        assert_eq!(summary.total_views, 5500);
        assert_eq!(summary.top_country, "United States");
        assert_eq!(summary.top_hashtag, "#dance");
        assert_eq!(summary.title, "2025-01 TikTok Country Distribution");
        assert_eq!(
            summary.top_countries,
            vec![
                NamedViews { name: "United States".to_string(), views: 3500 },
                NamedViews { name: "United Kingdom".to_string(), views: 2000 },
            ]
        );
        assert!(report.contains("reaching **5,500** views"));
        assert!(report.contains("average engagement rate of **7.67%**"));
        assert!(report.contains("United States (3,500 views), United Kingdom (2,000 views)"));
        assert!(report.contains("**United States** accounted for 63.6% of all views"));
        assert_eq!(report_markdown.as_deref(), Some(report.as_str()));
    }

    #[test]
    fn empty_month_is_reported() {
        let conn = fixtures::conn();
        let response = build(&conn, &engine(), "TikTok", "2030-01").unwrap();
        assert_eq!(response.error(), Some("No data found for TikTok in 2030-01"));
    }
}
