//! `POST /api/reports/trend`: views per trend type for one platform and
//! country between two publish dates.

use super::{echo, finish, named_views, provided, rejected, run, sql, EchoInputs, ReportError};
use crate::config::AppConfig;
use crate::report_engine::template::thousands;
use crate::report_engine::ReportEngine;
use actix_web::{web, Responder};
use common::model::context::ReportContext;
use common::model::report::{ReportResponse, TrendSummary};
use common::requests::TrendReportRequest;
use rusqlite::{params, Connection, OptionalExtension};

const TEMPLATE: &str = "trend_report";

pub(crate) async fn process(
    config: web::Data<AppConfig>,
    engine: web::Data<ReportEngine>,
    payload: web::Json<TrendReportRequest>,
) -> impl Responder {
    let request = payload.into_inner();
    let (Some(platform), Some(country_code), Some(start_date), Some(end_date)) = (
        provided(request.platform),
        provided(request.country_code),
        provided(request.start_date),
        provided(request.end_date),
    ) else {
        return rejected("Please provide platform, country code, start date and end date");
    };
    run(&config, *engine.get_ref(), move |conn, engine| {
        build(conn, engine, &platform, &country_code, &start_date, &end_date)
    })
    .await
}

pub(crate) fn build(
    conn: &Connection,
    engine: &ReportEngine,
    platform: &str,
    country_code: &str,
    start_date: &str,
    end_date: &str,
) -> Result<ReportResponse<TrendSummary>, ReportError> {
    let country_id: Option<i64> = conn
        .query_row(&sql(conn, "trend_country_check")?, params![country_code], |row| row.get(0))
        .optional()?;
    let Some(country_id) = country_id else {
        return Ok(ReportResponse::failed(format!(
            "Error: No records found for country code '{}'",
            country_code
        )));
    };

    let trend_types = named_views(
        conn,
        "trend_main",
        params![platform, country_id, start_date, end_date],
    )?;
    let Some(top) = trend_types.first() else {
        return Ok(ReportResponse::failed(format!(
            "No trend data found on {} in {} between {} and {}",
            platform, country_code, start_date, end_date
        )));
    };
    let top_trend_type = top.name.clone();
    let trend_list_text = trend_types
        .iter()
        .map(|t| format!("{}: {} views", t.name, thousands(t.views)))
        .collect::<Vec<_>>()
        .join(", ");

    let context = ReportContext::new()
        .with("platform", platform)
        .with("country_code", country_code)
        .with("start_date", start_date)
        .with("end_date", end_date)
        .with("top_trend_type", top_trend_type.as_str())
        .with("trend_list_text", trend_list_text)
        .with("trend_count", trend_types.len());

    let summary = TrendSummary {
        platform: platform.to_string(),
        country_code: country_code.to_string(),
        start_date: start_date.to_string(),
        end_date: end_date.to_string(),
        top_trend_type,
        trend_types,
    };
    finish(conn, engine, TEMPLATE, &context, summary)
}

impl EchoInputs for TrendSummary {
    fn echo_inputs(&self) -> serde_json::Map<String, serde_json::Value> {
        echo(serde_json::json!({
            "platform": self.platform,
            "country_code": self.country_code,
            "start_date": self.start_date,
            "end_date": self.end_date,
        }))
    }
}
