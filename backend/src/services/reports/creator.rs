//! # Creator Performance Report
//!
//! `POST /api/reports/creator-performance` breaks a platform's views over a
//! month range down by creator tier. The scope picks the tiers:
//!
//! - `All (all tiers)` (also any unknown scope): Micro, Mid, Macro and Star
//! - `Micro Only`, `Mid Only`, `Macro Only`, `Star Only`: that tier alone,
//!   plus a month by month trend for it
//!
//! The tier query holds a `{tier_placeholders}` marker that is expanded to one
//! `?` per selected tier before the statement is prepared.

use super::stats::round_to;
use super::{finish, provided, rejected, run, sql, EchoInputs, ReportError};
use crate::config::AppConfig;
use crate::report_engine::ReportEngine;
use actix_web::{web, Responder};
use common::model::context::{ContextValue, ReportContext};
use common::model::report::{CreatorPerformanceSummary, MonthlyViews, ReportResponse, TierBreakdown};
use common::requests::CreatorPerformanceRequest;
use rusqlite::{params, params_from_iter, Connection};

const TEMPLATE: &str = "creator_performance";
const DEFAULT_SCOPE: &str = "All (all tiers)";
const ALL_TIERS: [&str; 4] = ["Micro", "Mid", "Macro", "Star"];

pub(crate) async fn process(
    config: web::Data<AppConfig>,
    engine: web::Data<ReportEngine>,
    payload: web::Json<CreatorPerformanceRequest>,
) -> impl Responder {
    let request = payload.into_inner();
    let (Some(platform), Some(start_month), Some(end_month)) = (
        provided(request.platform),
        provided(request.start_month),
        provided(request.end_month),
    ) else {
        return rejected("Please provide platform, start_month and end_month");
    };
    let creator_scope = provided(request.creator_scope).unwrap_or_else(|| DEFAULT_SCOPE.to_string());
    run(&config, *engine.get_ref(), move |conn, engine| {
        build(conn, engine, &platform, &creator_scope, &start_month, &end_month)
    })
    .await
}

/// Tiers covered by a creator scope.
pub(crate) fn scope_tiers(creator_scope: &str) -> Vec<&'static str> {
    match creator_scope {
        "Micro Only" => vec!["Micro"],
        "Mid Only" => vec!["Mid"],
        "Macro Only" => vec!["Macro"],
        "Star Only" => vec!["Star"],
        _ => ALL_TIERS.to_vec(),
    }
}

pub(crate) fn build(
    conn: &Connection,
    engine: &ReportEngine,
    platform: &str,
    creator_scope: &str,
    start_month: &str,
    end_month: &str,
) -> Result<ReportResponse<CreatorPerformanceSummary>, ReportError> {
    let total_views: i64 = conn
        .query_row(
            &sql(conn, "creator_total_views")?,
            params![platform, start_month, end_month],
            |row| row.get::<_, Option<i64>>(0),
        )?
        .unwrap_or(0);
    let time_frame = format!("{} to {}", start_month, end_month);

    let tiers = scope_tiers(creator_scope);
    let placeholders = vec!["?"; tiers.len()].join(", ");
    let tier_sql = sql(conn, "creator_tier_agg")?.replace("{tier_placeholders}", &placeholders);
    let mut values = vec![platform];
    values.extend(tiers.iter().copied());
    values.extend([start_month, end_month]);

    let mut stmt = conn.prepare(&tier_sql)?;
    let rows = stmt
        .query_map(params_from_iter(values.iter()), |row| {
            Ok((
                row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                row.get::<_, Option<i64>>(1)?.unwrap_or(0),
                row.get::<_, Option<i64>>(2)?.unwrap_or(0),
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let monthly_trend = match tiers.as_slice() {
        [tier] => monthly_trend(conn, platform, tier, start_month, end_month)?,
        _ => Vec::new(),
    };

    let breakdown: Vec<TierBreakdown> = if total_views > 0 {
        rows.into_iter()
            .map(|(tier, views, content_count)| TierBreakdown {
                pct: round_to(views as f64 / total_views as f64 * 100.0, 1),
                avg_views: if content_count > 0 {
                    round_to(views as f64 / content_count as f64, 0) as i64
                } else {
                    0
                },
                tier,
                views,
                content_count,
            })
            .collect()
    } else {
        Vec::new()
    };

    let tier_details: Vec<ContextValue> = breakdown
        .iter()
        .map(|t| {
            ContextValue::record([
                ("tier", ContextValue::from(t.tier.as_str())),
                ("views", t.views.into()),
                ("pct", t.pct.into()),
                ("content_count", t.content_count.into()),
                ("avg_views", t.avg_views.into()),
            ])
        })
        .collect();

    let context = ReportContext::new()
        .with("platform", platform)
        .with("creator_scope", creator_scope)
        .with("time_frame", time_frame.as_str())
        .with("total_views", total_views)
        .with("tier_count", tier_details.len())
        .with("tier_details", tier_details);

    let summary = CreatorPerformanceSummary {
        platform: platform.to_string(),
        creator_scope: creator_scope.to_string(),
        time_frame,
        total_views,
        tiers: breakdown,
        monthly_trend,
    };
    finish(conn, engine, TEMPLATE, &context, summary)
}

fn monthly_trend(
    conn: &Connection,
    platform: &str,
    tier: &str,
    start_month: &str,
    end_month: &str,
) -> Result<Vec<MonthlyViews>, ReportError> {
    let sql = sql(conn, "creator_monthly_trend")?;
    let mut stmt = conn.prepare(&sql)?;
    let months = stmt
        .query_map(params![platform, tier, start_month, end_month], |row| {
            Ok(MonthlyViews {
                month: row.get(0)?,
                views: row.get::<_, Option<i64>>(1)?.unwrap_or(0),
                count: row.get::<_, Option<i64>>(2)?.unwrap_or(0),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(months)
}

impl EchoInputs for CreatorPerformanceSummary {}
