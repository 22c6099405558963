//! # Template Service Module
//!
//! This module aggregates the API endpoints that manage report templates.
//! It routes requests under `/api/templates` to the handlers in its sub-modules.
//!
//! ## Sub-modules:
//! - `get`: Reads one stored template by slug.
//! - `save`: Creates or replaces a template.
//! - `preview`: Validates and renders a stored template against a caller-supplied context.

mod get;
mod preview;
mod save;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

/// The base path for all template-related API endpoints.
const API_PATH: &str = "/api/templates";

/// Configures and returns the Actix `Scope` for all template-related routes.
///
/// # Registered Routes:
///
/// *   **`POST /save`**:
///     - **Handler**: `save::process`
///     - **Description**: Creates a new template or replaces the one stored under the
///       same slug. Expects a JSON `ReportTemplate` with `slug`, `name`, `format`,
///       `content` and optional `metadata.fields`.
///
/// *   **`GET /{slug}`**:
///     - **Handler**: `get::process`
///     - **Description**: Returns the stored template, or `404` for an unknown slug.
///
/// *   **`POST /{slug}/preview`**:
///     - **Handler**: `preview::process`
///     - **Description**: Runs the field check and the renderer on the given context
///       and returns either `{ "error": ... }` or the `{ text, markdown, html }` trio.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/save", post().to(save::process))
        .route("/{slug}", get().to(get::process))
        .route("/{slug}/preview", post().to(preview::process))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::db::{self, schema};
    use crate::report_engine::emitter::HtmlConverter;
    use crate::report_engine::ReportEngine;
    use actix_web::{test, web, App};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn save_get_and_preview() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("templates.db");
        schema::ensure_tables(&db::open(&db_path).unwrap()).unwrap();
        let config = AppConfig {
            db_path,
            ..AppConfig::default()
        };
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(config))
                .app_data(web::Data::new(ReportEngine::new(HtmlConverter::Fallback)))
                .service(configure_routes()),
        )
        .await;

        let template = json!({
            "slug": "demo",
            "name": "Demo",
            "format": "text",
            "content": "Views: {{ total_views | format_comma }}",
            "metadata": {"fields": ["total_views"]}
        });
        let req = test::TestRequest::post()
            .uri("/api/templates/save")
            .set_json(&template)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status().as_u16(), 200);

        let req = test::TestRequest::get().uri("/api/templates/demo").to_request();
        let stored: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(stored, template);

        let req = test::TestRequest::get().uri("/api/templates/unknown").to_request();
        assert_eq!(test::call_service(&app, req).await.status().as_u16(), 404);

        let req = test::TestRequest::post()
            .uri("/api/templates/demo/preview")
            .set_json(json!({"context": {"total_views": 2500000}}))
            .to_request();
        let rendered: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(rendered["text"], "Views: 2,500,000");
        assert_eq!(rendered["html"], "<div>Views: 2,500,000</div>");

        let req = test::TestRequest::post()
            .uri("/api/templates/demo/preview")
            .set_json(json!({"context": {"total_views": null}}))
            .to_request();
        let rejected: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            rejected,
            json!({"error": "Missing values for: total_views. Please check your inputs and try again."})
        );
    }

    #[actix_web::test]
    async fn blank_slug_is_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(AppConfig::default()))
                .service(configure_routes()),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/api/templates/save")
            .set_json(json!({"slug": "  ", "name": "x", "format": "text", "content": ""}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status().as_u16(), 400);
    }
}
