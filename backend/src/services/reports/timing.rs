//! # Publish Timing Report
//!
//! `POST /api/reports/publish-timing` relates mean engagement to when content
//! was published, along one of three dimensions:
//!
//! - `Hourly`: per upload hour, with the peak and valley hours and six day
//!   segments (`Late Night` 0-4, `Early Morning` 5-8, `Morning` 9-11,
//!   `Afternoon` 12-16, `Evening` 17-20, `Night` 21-23)
//! - `Day Parts`: per publish period, best, worst and top three
//! - `Week Analysis`: per weekday, best, worst, top three and the weekend lift
//!   over weekdays
//!
//! Every bucket's engagement is expressed in percent and compared with the
//! mean over all buckets. A `Custom` period restricts the data to a
//! `YYYY-MM` range by expanding the `{date_filter}` marker of the query.

use super::stats::{diff_pct, first_max, first_min, mean, round_to};
use super::{echo, finish, provided, rejected, run, sql, EchoInputs, ReportError};
use crate::config::AppConfig;
use crate::report_engine::ReportEngine;
use actix_web::{web, Responder};
use chrono::NaiveDate;
use common::model::context::{ContextValue, ReportContext};
use common::model::report::{PublishTimingSummary, ReportResponse, TimingBucket};
use common::requests::PublishTimingRequest;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::cmp::Ordering;

const TEMPLATE: &str = "publish_timing_analysis";
const DATE_FILTER: &str = " AND c.year_month BETWEEN ? AND ?";
const NO_DATA: &str = "No data available for the selected criteria.";
const NO_VALID_DATA: &str = "No valid data found.";

const SEGMENTS: [(&str, u32, u32); 6] = [
    ("Late Night", 0, 4),
    ("Early Morning", 5, 8),
    ("Morning", 9, 11),
    ("Afternoon", 12, 16),
    ("Evening", 17, 20),
    ("Night", 21, 23),
];
const WEEKEND: [&str; 2] = ["Saturday", "Sunday"];
const WEEKDAYS: [&str; 5] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimeAnalysis {
    Hourly,
    DayParts,
    Week,
}

impl TimeAnalysis {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "Hourly" => Some(TimeAnalysis::Hourly),
            "Day Parts" => Some(TimeAnalysis::DayParts),
            "Week Analysis" => Some(TimeAnalysis::Week),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            TimeAnalysis::Hourly => "Hourly",
            TimeAnalysis::DayParts => "Day Parts",
            TimeAnalysis::Week => "Week Analysis",
        }
    }

    fn query_slug(self) -> &'static str {
        match self {
            TimeAnalysis::Hourly => "publish_timing_hourly",
            TimeAnalysis::DayParts => "publish_timing_dayparts",
            TimeAnalysis::Week => "publish_timing_week",
        }
    }
}

/// A checked publish timing request.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TimingQuery {
    pub platform: String,
    pub analysis: TimeAnalysis,
    /// `(start_month, end_month)` for a custom period, `None` for all time.
    pub months: Option<(String, String)>,
}

impl TimingQuery {
    fn period_display(&self) -> String {
        match &self.months {
            Some((start, end)) => format!("{} to {}", start, end),
            None => "All Time".to_string(),
        }
    }
}

pub(crate) async fn process(
    config: web::Data<AppConfig>,
    engine: web::Data<ReportEngine>,
    payload: web::Json<PublishTimingRequest>,
) -> impl Responder {
    let query = match check_request(payload.into_inner()) {
        Ok(query) => query,
        Err(message) => return rejected(message),
    };
    run(&config, *engine.get_ref(), move |conn, engine| build(conn, engine, &query)).await
}

fn is_year_month(value: &str) -> bool {
    NaiveDate::parse_from_str(&format!("{}-01", value), "%Y-%m-%d").is_ok()
}

pub(crate) fn check_request(request: PublishTimingRequest) -> Result<TimingQuery, &'static str> {
    let Some(platform) = provided(request.platform) else {
        return Err("Please provide platform");
    };
    let analysis = match request.time_analysis.as_deref() {
        None => TimeAnalysis::Hourly,
        Some(value) => TimeAnalysis::parse(value).ok_or(
            "Invalid time_analysis. Must be 'Hourly', 'Day Parts', or 'Week Analysis'",
        )?,
    };
    let months = if request.period.as_deref() == Some("Custom") {
        let (Some(start), Some(end)) = (provided(request.start_month), provided(request.end_month)) else {
            return Err("For custom period, please provide both start_month and end_month in format 'YYYY-MM'");
        };
        if !is_year_month(&start) || !is_year_month(&end) {
            return Err("Invalid date format. Please use 'YYYY-MM' format (e.g., '2025-01')");
        }
        Some((start, end))
    } else {
        None
    };
    Ok(TimingQuery {
        platform,
        analysis,
        months,
    })
}

/// One aggregated row: bucket key, mean engagement rate (0..1) and content count.
struct BucketRow {
    key: Option<Value>,
    engagement: Option<f64>,
    count: i64,
}

fn fetch_rows(conn: &Connection, query: &TimingQuery) -> Result<Vec<BucketRow>, ReportError> {
    let (filter, mut params) = match &query.months {
        Some((start, end)) => (DATE_FILTER, vec![start.clone(), end.clone()]),
        None => ("", Vec::new()),
    };
    params.insert(0, query.platform.clone());
    let sql = sql(conn, query.analysis.query_slug())?.replace("{date_filter}", filter);

    // Hourly rows carry max, min, views and completion before the count.
    let count_column = match query.analysis {
        TimeAnalysis::Hourly => 6,
        TimeAnalysis::DayParts | TimeAnalysis::Week => 2,
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(params.iter()), |row| {
            Ok(BucketRow {
                key: row.get(0)?,
                engagement: row.get(1)?,
                count: row.get::<_, Option<i64>>(count_column)?.unwrap_or(0),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn engagement_pct(engagement: Option<f64>) -> f64 {
    round_to(engagement.map_or(0.0, |e| e * 100.0), 2)
}

/// Buckets with a usable key, in query order.
fn buckets(rows: Vec<BucketRow>, analysis: TimeAnalysis) -> Vec<(String, f64, i64)> {
    rows.into_iter()
        .filter_map(|row| {
            let label = match (analysis, row.key) {
                (TimeAnalysis::Hourly, Some(Value::Integer(hour))) if (0..=23).contains(&hour) => {
                    hour.to_string()
                }
                (TimeAnalysis::Hourly, Some(Value::Real(hour)))
                    if hour.fract() == 0.0 && (0.0..=23.0).contains(&hour) =>
                {
                    (hour as i64).to_string()
                }
                (TimeAnalysis::DayParts | TimeAnalysis::Week, Some(Value::Text(name)))
                    if !name.is_empty() =>
                {
                    name
                }
                _ => return None,
            };
            Some((label, engagement_pct(row.engagement), row.count))
        })
        .collect()
}

pub(crate) fn build(
    conn: &Connection,
    engine: &ReportEngine,
    query: &TimingQuery,
) -> Result<ReportResponse<PublishTimingSummary>, ReportError> {
    let rows = fetch_rows(conn, query)?;
    if rows.is_empty() {
        return Ok(ReportResponse::failed(NO_DATA));
    }
    let buckets = buckets(rows, query.analysis);
    if buckets.is_empty() {
        return Ok(ReportResponse::failed(NO_VALID_DATA));
    }

    let rates: Vec<f64> = buckets.iter().map(|(_, rate, _)| *rate).collect();
    let avg_eng_total = round_to(mean(&rates), 2);
    let diffs: Vec<f64> = rates.iter().map(|rate| diff_pct(*rate, avg_eng_total)).collect();

    let mut context = ReportContext::new()
        .with("platform", query.platform.as_str())
        .with("time_analysis", query.analysis.label())
        .with("period_display", query.period_display())
        .with("avg_eng_total", avg_eng_total);
    match query.analysis {
        TimeAnalysis::Hourly => hourly_context(&mut context, &buckets, &diffs),
        TimeAnalysis::DayParts => ranked_context(&mut context, "period", "top3_periods", &buckets, &diffs),
        TimeAnalysis::Week => {
            ranked_context(&mut context, "day", "top3_days", &buckets, &diffs);
            weekend_context(&mut context, &buckets);
        }
    }

    let summary = PublishTimingSummary {
        platform: query.platform.clone(),
        time_analysis: query.analysis.label().to_string(),
        period_display: query.period_display(),
        avg_eng_total,
        buckets: buckets
            .into_iter()
            .zip(diffs)
            .map(|((label, engagement_rate, content_count), eng_diff_pct)| TimingBucket {
                label,
                engagement_rate,
                eng_diff_pct,
                content_count,
            })
            .collect(),
    };
    finish(conn, engine, TEMPLATE, &context, summary)
}

fn hourly_context(context: &mut ReportContext, buckets: &[(String, f64, i64)], diffs: &[f64]) {
    let hours: Vec<u32> = buckets
        .iter()
        .map(|(label, _, _)| label.parse().unwrap_or(0))
        .collect();

    if let (Some(peak), Some(valley)) = (first_max(diffs), first_min(diffs)) {
        context.insert("peak_hour", hours[peak]);
        context.insert("peak_eng_rate", buckets[peak].1);
        context.insert("peak_diff_pct", diffs[peak]);
        context.insert("valley_hour", hours[valley]);
        context.insert("valley_eng_rate", buckets[valley].1);
        context.insert("valley_diff_pct", diffs[valley]);
    }

    let mut segment_diffs = Vec::with_capacity(SEGMENTS.len());
    let mut segment_data = Vec::new();
    for (name, first, last) in SEGMENTS {
        let members: Vec<usize> = (0..hours.len())
            .filter(|&i| (first..=last).contains(&hours[i]))
            .collect();
        let member_diffs: Vec<f64> = members.iter().map(|&i| diffs[i]).collect();
        let member_rates: Vec<f64> = members.iter().map(|&i| buckets[i].1).collect();
        let diff = round_to(mean(&member_diffs), 1);
        let eng = round_to(mean(&member_rates), 2);
        let count: i64 = members.iter().map(|&i| buckets[i].2).sum();
        segment_diffs.push(diff);
        if count > 0 {
            segment_data.push(ContextValue::record([
                ("name", ContextValue::from(name)),
                ("diff", diff.into()),
                ("eng", eng.into()),
            ]));
        }
    }
    let best = first_max(&segment_diffs).unwrap_or(0);
    context.insert("best_segment", SEGMENTS[best].0);
    context.insert("best_segment_diff", segment_diffs[best]);
    context.insert("segment_data", segment_data);
}

/// Best, worst and top three buckets by difference to the mean. `noun` names
/// the context keys, e.g. `best_period_name` or `best_day_name`.
fn ranked_context(
    context: &mut ReportContext,
    noun: &str,
    top_key: &str,
    buckets: &[(String, f64, i64)],
    diffs: &[f64],
) {
    let mut order: Vec<usize> = (0..buckets.len()).collect();
    order.sort_by(|&a, &b| diffs[b].partial_cmp(&diffs[a]).unwrap_or(Ordering::Equal));

    for (rank, index) in [("best", order.first()), ("worst", order.last())] {
        let Some(&i) = index else { continue };
        context.insert(format!("{}_{}_name", rank, noun), buckets[i].0.as_str());
        context.insert(format!("{}_{}_eng", rank, noun), buckets[i].1);
        context.insert(format!("{}_{}_diff", rank, noun), diffs[i]);
        context.insert(format!("{}_{}_count", rank, noun), buckets[i].2);
    }

    let top: Vec<ContextValue> = order
        .iter()
        .take(3)
        .map(|&i| {
            ContextValue::record([
                ("name", ContextValue::from(buckets[i].0.as_str())),
                ("diff", diffs[i].into()),
            ])
        })
        .collect();
    context.insert(top_key, top);
}

fn weekend_context(context: &mut ReportContext, buckets: &[(String, f64, i64)]) {
    let rates_of = |days: &[&str]| -> Vec<f64> {
        buckets
            .iter()
            .filter(|(day, _, _)| days.contains(&day.as_str()))
            .map(|(_, rate, _)| *rate)
            .collect()
    };
    let weekend_eng = round_to(mean(&rates_of(&WEEKEND[..])), 2);
    let weekday_eng = round_to(mean(&rates_of(&WEEKDAYS[..])), 2);
    context.insert("weekend_eng", weekend_eng);
    context.insert("weekday_eng", weekday_eng);
    context.insert("weekend_lift", diff_pct(weekend_eng, weekday_eng));
}

impl EchoInputs for PublishTimingSummary {
    fn echo_inputs(&self) -> serde_json::Map<String, serde_json::Value> {
        echo(serde_json::json!({
            "platform": self.platform,
            "time_analysis": self.time_analysis,
            "period_display": self.period_display,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report_engine::emitter::HtmlConverter;
    use crate::services::reports::fixtures;

    fn engine() -> ReportEngine {
        ReportEngine::new(HtmlConverter::Fallback)
    }

    fn query(analysis: TimeAnalysis, months: Option<(&str, &str)>) -> TimingQuery {
        TimingQuery {
            platform: "TikTok".to_string(),
            analysis,
            months: months.map(|(s, e)| (s.to_string(), e.to_string())),
        }
    }

    fn rendered(query: &TimingQuery) -> (PublishTimingSummary, String) {
        let conn = fixtures::conn();
        match build(&conn, &engine(), query).unwrap() {
            ReportResponse::Rendered { summary, report, .. } => (summary, report),
            ReportResponse::Failed { error, .. } => panic!("report failed: {}", error),
        }
    }

    #[test]
    fn hourly_finds_peak_valley_and_segment() {
        let (summary, report) = rendered(&query(TimeAnalysis::Hourly, None));
        assert_eq!(summary.avg_eng_total, 6.33);
        let labels: Vec<&str> = summary.buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["9", "18", "22"]);
        let diffs: Vec<f64> = summary.buckets.iter().map(|b| b.eng_diff_pct).collect();
        assert_eq!(diffs, vec![-21.0, -5.2, 26.4]);
        assert!(report.contains("The peak hour is **22:00** at 8.0% (+26.4% vs average)"));
        assert!(report.contains("the weakest is 9:00 at 5.0% (-21.0%)"));
        assert!(report.contains("The strongest segment is **Night** (+26.4%)."));
        assert!(report.contains("- Evening: 6.0% (-5.2%)"));
        assert!(!report.contains("Late Night"));
    }

    #[test]
    fn day_parts_rank_periods() {
        let (_, report) = rendered(&query(TimeAnalysis::DayParts, None));
        assert!(report.contains("**Night** performs best at 8.0%"));
        assert!(report.contains("**Morning** trails at 5.0%"));
        assert!(report.contains("1. Night ("));
    }

    #[test]
    fn week_reports_the_weekend_lift() {
        let (summary, report) = rendered(&query(TimeAnalysis::Week, None));
        let labels: Vec<&str> = summary.buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Monday", "Saturday", "Sunday"]);
        assert!(report.contains("**Sunday** performs best at 10.0%"));
        assert!(report.contains("**Monday** worst at 3.5%"));
        assert!(report.contains("Weekends average 9.0% against 3.5% on weekdays, a lift of +157.1%."));
    }

    #[test]
    fn custom_period_filters_months() {
        let (summary, report) = rendered(&query(TimeAnalysis::Week, Some(("2025-02", "2025-02"))));
        assert_eq!(summary.period_display, "2025-02 to 2025-02");
        assert_eq!(summary.buckets.len(), 1);
        assert!(report.contains("(2025-02 to 2025-02)"));
    }

    #[test]
    fn empty_selection_is_reported() {
        let conn = fixtures::conn();
        let response = build(
            &conn,
            &engine(),
            &query(TimeAnalysis::Hourly, Some(("2030-01", "2030-12"))),
        )
        .unwrap();
        assert_eq!(response.error(), Some(NO_DATA));
    }

    #[test]
    fn request_checks() {
        let request = |platform: Option<&str>,
                       analysis: Option<&str>,
                       period: Option<&str>,
                       start: Option<&str>| {
            PublishTimingRequest {
                platform: platform.map(String::from),
                time_analysis: analysis.map(String::from),
                period: period.map(String::from),
                start_month: start.map(String::from),
                end_month: Some("2025-03".to_string()),
            }
        };
        assert_eq!(
            check_request(request(None, None, None, None)),
            Err("Please provide platform")
        );
        assert_eq!(
            check_request(request(Some("TikTok"), Some("Monthly"), None, None)),
            Err("Invalid time_analysis. Must be 'Hourly', 'Day Parts', or 'Week Analysis'")
        );
        assert_eq!(
            check_request(request(Some("TikTok"), None, Some("Custom"), None)),
            Err("For custom period, please provide both start_month and end_month in format 'YYYY-MM'")
        );
        assert_eq!(
            check_request(request(Some("TikTok"), None, Some("Custom"), Some("2025/01"))),
            Err("Invalid date format. Please use 'YYYY-MM' format (e.g., '2025-01')")
        );
        assert_eq!(
            check_request(request(Some("TikTok"), Some("Day Parts"), Some("Custom"), Some("2025-01"))),
            Ok(TimingQuery {
                platform: "TikTok".to_string(),
                analysis: TimeAnalysis::DayParts,
                months: Some(("2025-01".to_string(), "2025-03".to_string())),
            })
        );
        assert_eq!(
            check_request(request(Some("TikTok"), None, Some("All Time"), None))
                .map(|q| q.months),
            Ok(None)
        );
    }
}
