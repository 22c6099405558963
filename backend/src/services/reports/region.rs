//! `POST /api/reports/region-ad-reco`: recommends a platform and content
//! category for advertising in a region, comparing the top three categories by
//! mean engagement on TikTok and on YouTube.

use super::{finish, provided, rejected, run, sql, EchoInputs, ReportError};
use crate::config::AppConfig;
use crate::report_engine::ReportEngine;
use actix_web::{web, Responder};
use common::model::context::ReportContext;
use common::model::report::{CategoryEngagement, RegionRecommendationSummary, ReportResponse};
use common::requests::RegionRecommendationRequest;
use rusqlite::{params, Connection};

const TEMPLATE: &str = "region_ad_recommendation";
const TOP: usize = 3;

pub(crate) async fn process(
    config: web::Data<AppConfig>,
    engine: web::Data<ReportEngine>,
    payload: web::Json<RegionRecommendationRequest>,
) -> impl Responder {
    let Some(region) = provided(payload.into_inner().region) else {
        return rejected("Please provide region");
    };
    run(&config, *engine.get_ref(), move |conn, engine| build(conn, engine, &region)).await
}

struct CategoryRow {
    platform: String,
    category: String,
    engagement: f64,
}

fn top_of<'a>(rows: &'a [CategoryRow], platform: &str) -> Vec<&'a CategoryRow> {
    rows.iter().filter(|r| r.platform == platform).take(TOP).collect()
}

/// Category and engagement of the first row, empty when there is none.
fn leader(top: &[&CategoryRow]) -> (String, f64) {
    top.first()
        .map(|r| (r.category.clone(), r.engagement))
        .unwrap_or_default()
}

fn as_summary(top: &[&CategoryRow]) -> Vec<CategoryEngagement> {
    top.iter()
        .map(|r| CategoryEngagement {
            category: r.category.clone(),
            engagement: r.engagement as i64,
        })
        .collect()
}

/// `", followed by A and B"`, `", followed by A"` or nothing.
fn followed_by(top: &[&CategoryRow]) -> String {
    match top {
        [_, second, third, ..] => format!(", followed by {} and {}", second.category, third.category),
        [_, second] => format!(", followed by {}", second.category),
        _ => String::new(),
    }
}

pub(crate) fn build(
    conn: &Connection,
    engine: &ReportEngine,
    region: &str,
) -> Result<ReportResponse<RegionRecommendationSummary>, ReportError> {
    let sql = sql(conn, "region_engagement_main")?;
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params![region], |row| {
            Ok(CategoryRow {
                platform: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                category: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                engagement: row.get::<_, Option<f64>>(2)?.unwrap_or(0.0),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    if rows.is_empty() {
        return Ok(ReportResponse::failed(format!("No data found for {} region", region)));
    }

    let tiktok = top_of(&rows, "TikTok");
    let youtube = top_of(&rows, "YouTube");

    let (category_tiktok, engagement_tiktok) = leader(&tiktok);
    let (category_youtube, engagement_youtube) = leader(&youtube);

    let (best_platform, best_category, best_engagement, comparison_engagement) =
        if tiktok.is_empty() || youtube.is_empty() {
            ("", String::new(), 0.0, 0.0)
        } else if engagement_tiktok > engagement_youtube {
            ("TikTok", category_tiktok.clone(), engagement_tiktok, engagement_youtube)
        } else {
            ("YouTube", category_youtube.clone(), engagement_youtube, engagement_tiktok)
        };

    let context = ReportContext::new()
        .with("region", region)
        .with("category_tiktok", category_tiktok.as_str())
        .with("engagement_tiktok", engagement_tiktok)
        .with("tiktok_followed_by_text", followed_by(&tiktok))
        .with("category_youtube", category_youtube.as_str())
        .with("engagement_youtube", engagement_youtube)
        .with("youtube_followed_by_text", followed_by(&youtube))
        .with("best_platform", best_platform)
        .with("best_category", best_category.as_str())
        .with("best_engagement", best_engagement)
        .with("comparison_engagement", comparison_engagement);

    let summary = RegionRecommendationSummary {
        region: region.to_string(),
        tiktok_top: as_summary(&tiktok),
        youtube_top: as_summary(&youtube),
        best_platform: best_platform.to_string(),
        best_category,
    };
    finish(conn, engine, TEMPLATE, &context, summary)
}

impl EchoInputs for RegionRecommendationSummary {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report_engine::emitter::HtmlConverter;
    use crate::services::reports::fixtures;

    fn engine() -> ReportEngine {
        ReportEngine::new(HtmlConverter::Fallback)
    }

    #[test]
    fn recommends_the_more_engaging_platform() {
        let conn = fixtures::conn();
        let response = build(&conn, &engine(), "North America").unwrap();
        let ReportResponse::Rendered { summary, report, report_markdown, report_html, .. } = response
        else {
            panic!("expected a rendered report");
        };
        assert_eq!(summary.best_platform, "YouTube");
        assert_eq!(summary.best_category, "Tech");
        assert_eq!(
            summary.tiktok_top,
            vec![
                CategoryEngagement { category: "Comedy".to_string(), engagement: 150 },
                CategoryEngagement { category: "Dance".to_string(), engagement: 100 },
            ]
        );
        let html = report_html.unwrap();
        assert!(html.contains(r#"<span class="highlight-data">Comedy</span> (150 interactions per post), followed by Dance."#));
        assert!(html.contains(r#"run ads on <span class="highlight-data">YouTube</span>"#));
        assert!(html.contains("leads the other platform by 50 interactions per post"));
        assert_eq!(report_markdown, None);
        assert!(!report.contains("<strong>"));
    }

    #[test]
    fn single_platform_region_misses_the_comparison() {
        let conn = fixtures::conn();
        let response = build(&conn, &engine(), "Europe").unwrap();
        assert_eq!(
            response.error(),
            Some("Missing values for: category_youtube, best_platform. Please check your inputs and try again.")
        );
    }

    #[test]
    fn unknown_region() {
        let conn = fixtures::conn();
        let response = build(&conn, &engine(), "Mars").unwrap();
        assert_eq!(response.error(), Some("No data found for Mars region"));
    }
}
