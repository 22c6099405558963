//! # Platform Dominance Report
//!
//! `POST /api/reports/platform-dominance` compares TikTok and YouTube inside
//! one country on two axes and combines them:
//!
//! - **quantity**: number of videos; ties go to YouTube
//! - **quality**: `median engagement rate (%) * 0.6 + mean engagement per 1k views * 0.4`
//! - **overall**: `videos * 0.5 + quality * 0.5`
//!
//! Quality and overall ties go to TikTok.

use super::stats::median;
use super::{finish, provided, rejected, run, sql, EchoInputs, ReportError};
use crate::config::AppConfig;
use crate::report_engine::ReportEngine;
use actix_web::{web, Responder};
use common::model::context::ReportContext;
use common::model::report::{PlatformDominanceSummary, PlatformFigures, ReportResponse};
use common::requests::PlatformDominanceRequest;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;

const TEMPLATE: &str = "platform_dominance_extended";
const TIKTOK: &str = "TikTok";
const YOUTUBE: &str = "YouTube";

pub(crate) async fn process(
    config: web::Data<AppConfig>,
    engine: web::Data<ReportEngine>,
    payload: web::Json<PlatformDominanceRequest>,
) -> impl Responder {
    let Some(country_code) = provided(payload.into_inner().country_code) else {
        return rejected("Please provide country_code");
    };
    run(&config, *engine.get_ref(), move |conn, engine| {
        build(conn, engine, &country_code)
    })
    .await
}

struct PlatformAggregate {
    platform: String,
    videos: i64,
    views: i64,
    avg_engagement_per_1k: f64,
}

fn figures(aggregate: &PlatformAggregate, engagement_rates: Vec<Option<f64>>) -> PlatformFigures {
    let median_engagement_rate_pct = median(engagement_rates) * 100.0;
    let quality_score = median_engagement_rate_pct * 0.6 + aggregate.avg_engagement_per_1k * 0.4;
    PlatformFigures {
        total_videos: aggregate.videos,
        total_views: aggregate.views,
        median_engagement_rate_pct,
        avg_engagement_per_1k: aggregate.avg_engagement_per_1k,
        quality_score,
        overall_score: aggregate.videos as f64 * 0.5 + quality_score * 0.5,
    }
}

/// Python-style list of platform names, e.g. `['TikTok']`.
fn name_list(names: &[&str]) -> String {
    let quoted: Vec<String> = names.iter().map(|n| format!("'{}'", n)).collect();
    format!("[{}]", quoted.join(", "))
}

pub(crate) fn build(
    conn: &Connection,
    engine: &ReportEngine,
    country_code: &str,
) -> Result<ReportResponse<PlatformDominanceSummary>, ReportError> {
    let country = conn
        .query_row(&sql(conn, "pd_country_check")?, params![country_code], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            ))
        })
        .optional()?;
    let Some((country_id, country_name)) = country else {
        return Ok(ReportResponse::failed(format!(
            "Error: No data found for country code '{}'",
            country_code
        )));
    };

    let aggregates = {
        let sql = sql(conn, "pd_agg_by_country")?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![country_id], |row| {
                Ok(PlatformAggregate {
                    platform: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                    videos: row.get::<_, Option<i64>>(1)?.unwrap_or(0),
                    views: row.get::<_, Option<i64>>(2)?.unwrap_or(0),
                    avg_engagement_per_1k: row.get::<_, Option<f64>>(4)?.unwrap_or(0.0),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows
    };
    if aggregates.len() < 2 {
        let available: Vec<&str> = aggregates.iter().map(|a| a.platform.as_str()).collect();
        return Ok(ReportResponse::failed(format!(
            "Error: Only found data for {} in {}, need both platforms for comparison",
            name_list(&available),
            country_name
        )));
    }

    let mut engagement_rates: BTreeMap<String, Vec<Option<f64>>> = BTreeMap::new();
    {
        let sql = sql(conn, "pd_details_by_country")?;
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params![country_id])?;
        while let Some(row) = rows.next()? {
            let platform: Option<String> = row.get(0)?;
            let rate: Option<f64> = row.get(1)?;
            engagement_rates
                .entry(platform.unwrap_or_default())
                .or_default()
                .push(rate);
        }
    }

    let find = |platform: &str| aggregates.iter().find(|a| a.platform == platform);
    let (Some(t), Some(y)) = (find(TIKTOK), find(YOUTUBE)) else {
        return Ok(ReportResponse::failed(
            "Error: Cannot get complete data for both platforms",
        ));
    };
    let tiktok = figures(t, engagement_rates.remove(TIKTOK).unwrap_or_default());
    let youtube = figures(y, engagement_rates.remove(YOUTUBE).unwrap_or_default());

    let quantity_leader = if tiktok.total_videos > youtube.total_videos { TIKTOK } else { YOUTUBE };
    let quality_leader = if tiktok.quality_score >= youtube.quality_score { TIKTOK } else { YOUTUBE };
    let dominant_platform = if tiktok.overall_score >= youtube.overall_score { TIKTOK } else { YOUTUBE };

    let context = ReportContext::new()
        .with("country_name", country_name.as_str())
        .with("tiktok_videos", tiktok.total_videos)
        .with("tiktok_views", tiktok.total_views)
        .with("youtube_videos", youtube.total_videos)
        .with("youtube_views", youtube.total_views)
        .with("quantity_leader", quantity_leader)
        .with("videos_diff", (tiktok.total_videos - youtube.total_videos).abs())
        .with("tiktok_median_er", format!("{:.2}", tiktok.median_engagement_rate_pct))
        .with("tiktok_e1k", format!("{:.1}", tiktok.avg_engagement_per_1k))
        .with("youtube_median_er", format!("{:.2}", youtube.median_engagement_rate_pct))
        .with("youtube_e1k", format!("{:.1}", youtube.avg_engagement_per_1k))
        .with("quality_leader", quality_leader)
        .with("dominant_platform", dominant_platform);

    let summary = PlatformDominanceSummary {
        country_code: country_code.to_string(),
        country_name,
        tiktok,
        youtube,
        quantity_leader: quantity_leader.to_string(),
        quality_leader: quality_leader.to_string(),
        dominant_platform: dominant_platform.to_string(),
    };
    finish(conn, engine, TEMPLATE, &context, summary)
}

impl EchoInputs for PlatformDominanceSummary {}
