//! # Template Retrieval Service
//!
//! Backend logic for `GET /api/templates/{slug}`.
//!
//! ## Workflow
//!
//! 1.  **HTTP Request**: `process` receives the `slug` from the URL path.
//!
//! 2.  **Database Query**: on the blocking pool a connection to the configured
//!     database is opened and the row is read from `report_templates`. The
//!     `metadata` column is parsed back into `TemplateMetadata`; unreadable JSON
//!     yields empty metadata.
//!
//! 3.  **HTTP Response**: the `ReportTemplate` is returned as JSON, `404` when the
//!     slug is unknown and `503` when the database cannot be read.

use crate::config::AppConfig;
use crate::db::{self, templates};
use actix_web::{web, HttpResponse, Responder};
use log::error;

pub(crate) async fn process(config: web::Data<AppConfig>, slug: web::Path<String>) -> impl Responder {
    let db_path = config.db_path.clone();
    let slug = slug.into_inner();
    let outcome = web::block(move || -> rusqlite::Result<_> {
        let conn = db::open(&db_path)?;
        templates::find_template(&conn, &slug)
    })
    .await;

    match outcome {
        Ok(Ok(Some(template))) => HttpResponse::Ok().json(template),
        Ok(Ok(None)) => HttpResponse::NotFound().body("Template not found"),
        Ok(Err(e)) => {
            error!("Reading template failed: {}", e);
            HttpResponse::ServiceUnavailable().body(format!("Error retrieving template: {}", e))
        }
        Err(e) => HttpResponse::ServiceUnavailable().body(format!("Error retrieving template: {}", e)),
    }
}
