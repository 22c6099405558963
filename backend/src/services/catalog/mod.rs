//! # Catalog Service Module
//!
//! Read-only lookups the dashboard uses to fill its selectors. Every list is
//! derived from the `Content` table, so only values that have data are offered.
//!
//! ## Sub-modules:
//! - `platforms`: distinct platform names.
//! - `countries`: countries with at least one content row.
//! - `year_months`: `YYYY-MM` buckets with display names.

mod countries;
mod platforms;
mod year_months;

use crate::config::AppConfig;
use crate::db;
use actix_web::web::{self, get, scope};
use actix_web::{HttpResponse, Scope};
use log::error;
use rusqlite::Connection;
use serde::Serialize;

const API_PATH: &str = "/api/catalog";

/// Configures the `/api/catalog` scope.
///
/// *   **`GET /platforms`**: `["TikTok", "YouTube"]`
/// *   **`GET /countries`**: `[{code, name, region, language}]`
/// *   **`GET /year-months`**: `[{year_month, year, month, month_name, display}]`
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/platforms", get().to(platforms::process))
        .route("/countries", get().to(countries::process))
        .route("/year-months", get().to(year_months::process))
}

/// Runs `read` on the blocking pool against a fresh connection and answers
/// with its result as JSON.
async fn read_catalog<T, F>(config: &AppConfig, read: F) -> HttpResponse
where
    T: Serialize + Send + 'static,
    F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
{
    let db_path = config.db_path.clone();
    let outcome = web::block(move || -> rusqlite::Result<T> {
        let conn = db::open(&db_path)?;
        read(&conn)
    })
    .await;

    match outcome {
        Ok(Ok(items)) => HttpResponse::Ok().json(items),
        Ok(Err(e)) => {
            error!("Catalog query failed: {}", e);
            HttpResponse::ServiceUnavailable().body(format!("Error reading catalog: {}", e))
        }
        Err(e) => HttpResponse::ServiceUnavailable().body(format!("Catalog worker unavailable: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::reports::fixtures;
    use actix_web::{test, App};
    use serde_json::{json, Value};

    async fn get_json(uri: &str) -> Value {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("catalog.db");
        fixtures::prepare(&db::open(&db_path).unwrap());
        let config = AppConfig {
            db_path,
            ..AppConfig::default()
        };
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(config))
                .service(configure_routes()),
        )
        .await;
        let req = test::TestRequest::get().uri(uri).to_request();
        test::call_and_read_body_json(&app, req).await
    }

    #[actix_web::test]
    async fn lists_platforms() {
        assert_eq!(get_json("/api/catalog/platforms").await, json!(["TikTok", "YouTube"]));
    }

    #[actix_web::test]
    async fn lists_countries_with_content() {
        let body = get_json("/api/catalog/countries").await;
        let codes: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["code"].as_str().unwrap())
            .collect();
        assert_eq!(codes, vec!["GB", "JP", "US"]);
        assert_eq!(body[2]["name"], "United States");
        assert_eq!(body[2]["region"], "North America");
    }

    #[actix_web::test]
    async fn lists_year_months_in_order() {
        let body = get_json("/api/catalog/year-months").await;
        assert_eq!(
            body,
            json!([
                {"year_month": "2025-01", "year": "2025", "month": "01", "month_name": "January", "display": "January 2025"},
                {"year_month": "2025-02", "year": "2025", "month": "02", "month_name": "February", "display": "February 2025"}
            ])
        );
    }
}
