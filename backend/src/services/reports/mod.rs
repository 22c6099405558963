//! # Report Service Module
//!
//! One endpoint per report type, grouped under `/api/reports`. Every handler
//! follows the same path:
//!
//! 1.  **Input check**: the JSON body is checked for the inputs the report
//!     needs. A missing input is answered with `{ "error": "..." }` and a
//!     `200 OK`, the same shape the dashboard uses for every user-facing problem.
//!
//! 2.  **Context building**: on actix's blocking pool the handler opens its own
//!     SQLite connection, looks up the report's SQL by slug in `report_queries`
//!     and reshapes the rows into a flat `ReportContext`.
//!
//! 3.  **Validation and rendering**: the context is checked against the
//!     template's required fields, then rendered by the shared `ReportEngine`
//!     into the text / markdown / html trio merged into the response.
//!
//! Database failures and unknown query slugs are reported as JSON errors.
//! Broken templates are a server fault and answer `500`.

mod creator;
mod dominance;
mod global;
mod hashtag;
mod region;
mod stats;
mod timing;
mod trend;

#[cfg(test)]
pub(crate) mod fixtures;

use crate::config::AppConfig;
use crate::db::{self, queries};
use crate::report_engine::error::{EngineError, TemplateError};
use crate::report_engine::ReportEngine;
use actix_web::web::{self, post, scope};
use actix_web::{HttpResponse, Scope};
use common::model::context::ReportContext;
use common::model::report::{NamedViews, ReportResponse};
use log::{debug, error};
use rusqlite::{Connection, Params};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

const API_PATH: &str = "/api/reports";

/// Registers every report endpoint:
///
/// | Route                       | Template slug                 |
/// |-----------------------------|-------------------------------|
/// | `POST /global-analysis`     | `global_analysis`             |
/// | `POST /hashtag`             | `hashtag_report`              |
/// | `POST /trend`               | `trend_report`                |
/// | `POST /creator-performance` | `creator_performance`         |
/// | `POST /region-ad-reco`      | `region_ad_recommendation`    |
/// | `POST /platform-dominance`  | `platform_dominance_extended` |
/// | `POST /publish-timing`      | `publish_timing_analysis`     |
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/global-analysis", post().to(global::process))
        .route("/hashtag", post().to(hashtag::process))
        .route("/trend", post().to(trend::process))
        .route("/creator-performance", post().to(creator::process))
        .route("/region-ad-reco", post().to(region::process))
        .route("/platform-dominance", post().to(dominance::process))
        .route("/publish-timing", post().to(timing::process))
}

#[derive(Debug, Error)]
pub(crate) enum ReportError {
    #[error("Database query error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("{0}")]
    Template(#[from] TemplateError),
    #[error("SQL query not found: {0}")]
    QueryNotFound(String),
}

impl From<EngineError> for ReportError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Database(e) => ReportError::Database(e),
            EngineError::Template(e) => ReportError::Template(e),
        }
    }
}

type ReportResult<T> = Result<ReportResponse<T>, ReportError>;

/// SQL text stored under `slug`.
pub(crate) fn sql(conn: &Connection, slug: &str) -> Result<String, ReportError> {
    queries::find_sql(conn, slug)?.ok_or_else(|| ReportError::QueryNotFound(slug.to_string()))
}

/// Runs a `(label, views)` query and collects its rows. NULL labels become
/// empty strings and NULL sums zero.
pub(crate) fn named_views<P: Params>(
    conn: &Connection,
    slug: &str,
    params: P,
) -> Result<Vec<NamedViews>, ReportError> {
    let sql = sql(conn, slug)?;
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params, |row| {
            Ok(NamedViews {
                name: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                views: row.get::<_, Option<i64>>(1)?.unwrap_or(0),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Request fields a report repeats next to a validation error. Reports without
/// an echo answer with the error alone.
pub(crate) trait EchoInputs {
    fn echo_inputs(&self) -> Map<String, Value> {
        Map::new()
    }
}

/// Fields of a `json!` object, for `EchoInputs` implementations.
pub(crate) fn echo(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(fields) => fields,
        _ => Map::new(),
    }
}

/// Validates `context` against `slug`, then renders it and merges the trio
/// into the response.
pub(crate) fn finish<T: EchoInputs>(
    conn: &Connection,
    engine: &ReportEngine,
    slug: &str,
    context: &ReportContext,
    summary: T,
) -> ReportResult<T> {
    if let Some(message) = engine.validate(conn, slug, context)? {
        debug!("Report '{}' rejected: {}", slug, message);
        return Ok(ReportResponse::failed_with(summary.echo_inputs(), message));
    }
    let rendered = engine.render(conn, slug, context)?;
    Ok(ReportResponse::rendered(summary, rendered))
}

/// Trimmed value of an optional input, `None` when absent or blank.
pub(crate) fn provided(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// User-facing rejection of a request before any query runs.
pub(crate) fn rejected(message: &str) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "error": message }))
}

/// Builds a report on the blocking pool with a connection of its own and
/// turns the outcome into the HTTP response.
pub(crate) async fn run<T, F>(config: &AppConfig, engine: ReportEngine, build: F) -> HttpResponse
where
    T: Serialize + Send + 'static,
    F: FnOnce(&Connection, &ReportEngine) -> ReportResult<T> + Send + 'static,
{
    let db_path = config.db_path.clone();
    let outcome = web::block(move || -> ReportResult<T> {
        let conn = db::open(&db_path)?;
        build(&conn, &engine)
    })
    .await;

    match outcome {
        Ok(Ok(response)) => HttpResponse::Ok().json(response),
        Ok(Err(ReportError::Template(e))) => {
            error!("Report template failed: {}", e);
            HttpResponse::InternalServerError().body(format!("Error rendering report: {}", e))
        }
        Ok(Err(e)) => {
            error!("Report failed: {}", e);
            HttpResponse::Ok().json(serde_json::json!({ "error": e.to_string() }))
        }
        Err(e) => HttpResponse::ServiceUnavailable().body(format!("Report worker unavailable: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::templates::upsert_template;
    use crate::report_engine::emitter::HtmlConverter;
    use actix_web::{test, App};
    use common::model::template::{ReportTemplate, TemplateFormat, TemplateMetadata};
    use serde_json::{json, Value};

    fn app_parts(dir: &tempfile::TempDir) -> (AppConfig, ReportEngine) {
        let db_path = dir.path().join("reports.db");
        let conn = db::open(&db_path).unwrap();
        fixtures::prepare(&conn);
        let config = AppConfig {
            db_path,
            ..AppConfig::default()
        };
        (config, ReportEngine::new(HtmlConverter::Fallback))
    }

    async fn post_json(
        config: AppConfig,
        engine: ReportEngine,
        uri: &str,
        body: Value,
    ) -> (u16, Value) {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(config))
                .app_data(web::Data::new(engine))
                .service(configure_routes()),
        )
        .await;
        let req = test::TestRequest::post().uri(uri).set_json(body).to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status().as_u16();
        let body: Value = serde_json::from_slice(&test::read_body(resp).await).unwrap_or(Value::Null);
        (status, body)
    }

    #[actix_web::test]
    async fn hashtag_endpoint_renders_the_report() {
        let dir = tempfile::tempdir().unwrap();
        let (config, engine) = app_parts(&dir);
        let (status, body) = post_json(
            config,
            engine,
            "/api/reports/hashtag",
            json!({"platform": "TikTok", "country_code": "US", "min_views": "500"}),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(body["error"], "");
        assert_eq!(body["hashtag_count"], 2);
        assert!(body["report"]
            .as_str()
            .unwrap()
            .contains("#fun (2,500 views), #dance (1,000 views)"));
        assert!(body["report_html"].as_str().unwrap().starts_with("<div>"));
    }

    #[actix_web::test]
    async fn missing_inputs_are_reported_as_data() {
        let dir = tempfile::tempdir().unwrap();
        let (config, engine) = app_parts(&dir);
        let (status, body) =
            post_json(config, engine, "/api/reports/hashtag", json!({"platform": "TikTok"})).await;
        assert_eq!(status, 200);
        assert_eq!(
            body,
            json!({"error": "Please provide platform, country code and minimum views"})
        );
    }

    #[actix_web::test]
    async fn unknown_query_slug_is_a_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let (config, engine) = app_parts(&dir);
        db::open(&config.db_path)
            .unwrap()
            .execute("DELETE FROM report_queries WHERE slug = 'hashtag_main'", [])
            .unwrap();
        let (status, body) = post_json(
            config,
            engine,
            "/api/reports/hashtag",
            json!({"platform": "TikTok", "country_code": "US", "min_views": 1}),
        )
        .await;
        assert_eq!(status, 200);
        assert_eq!(body, json!({"error": "SQL query not found: hashtag_main"}));
    }

    #[actix_web::test]
    async fn broken_template_is_a_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let (config, engine) = app_parts(&dir);
        upsert_template(
            &db::open(&config.db_path).unwrap(),
            &ReportTemplate {
                slug: "region_ad_recommendation".to_string(),
                name: "Broken".to_string(),
                format: TemplateFormat::Html,
                content: "{% for %}".to_string(),
                metadata: TemplateMetadata::default(),
            },
        )
        .unwrap();
        let (status, _) = post_json(
            config,
            engine,
            "/api/reports/region-ad-reco",
            json!({"region": "North America"}),
        )
        .await;
        assert_eq!(status, 500);
    }

    #[actix_web::test]
    async fn provided_ignores_blank_inputs() {
        assert_eq!(provided(Some("  US ".to_string())).as_deref(), Some("US"));
        assert_eq!(provided(Some("   ".to_string())), None);
        assert_eq!(provided(None), None);
    }
}
