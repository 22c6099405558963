//! `GET /api/catalog/year-months`: the `YYYY-MM` buckets present in the
//! dataset, oldest first. Values that are not exactly seven characters long
//! are skipped.

use super::read_catalog;
use crate::config::AppConfig;
use actix_web::{web, Responder};
use common::model::catalog::YearMonthEntry;
use rusqlite::Connection;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

pub(crate) async fn process(config: web::Data<AppConfig>) -> impl Responder {
    read_catalog(&config, list_year_months).await
}

fn list_year_months(conn: &Connection) -> rusqlite::Result<Vec<YearMonthEntry>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT year_month FROM Content WHERE year_month IS NOT NULL ORDER BY year_month",
    )?;
    let values = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(values.iter().filter_map(|v| entry(v)).collect())
}

/// An unknown month number is shown as-is.
fn entry(year_month: &str) -> Option<YearMonthEntry> {
    if year_month.len() != 7 {
        return None;
    }
    let year = year_month.get(..4)?;
    let month = year_month.get(5..7)?;
    let month_name = month
        .parse::<usize>()
        .ok()
        .and_then(|m| m.checked_sub(1))
        .and_then(|i| MONTH_NAMES.get(i))
        .map(|name| name.to_string())
        .unwrap_or_else(|| month.to_string());
    Some(YearMonthEntry {
        year_month: year_month.to_string(),
        year: year.to_string(),
        month: month.to_string(),
        display: format!("{} {}", month_name, year),
        month_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_display_names() {
        let december = entry("2024-12").unwrap();
        assert_eq!(december.month_name, "December");
        assert_eq!(december.display, "December 2024");
        assert_eq!(entry("2025-13").unwrap().display, "13 2025");
        assert!(entry("2025-1").is_none());
        assert!(entry("").is_none());
    }
}
