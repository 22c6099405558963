//! `POST /api/templates/{slug}/preview` lets template authors check an edit
//! without running a report: the stored template is validated and rendered
//! against the context sent in the body.

use crate::config::AppConfig;
use crate::db;
use crate::report_engine::error::EngineError;
use crate::report_engine::ReportEngine;
use actix_web::{web, HttpResponse, Responder};
use common::model::report::RenderedReport;
use common::requests::PreviewRequest;
use log::error;

enum Preview {
    Rejected(String),
    Rendered(RenderedReport),
}

pub(crate) async fn process(
    config: web::Data<AppConfig>,
    engine: web::Data<ReportEngine>,
    slug: web::Path<String>,
    payload: web::Json<PreviewRequest>,
) -> impl Responder {
    let db_path = config.db_path.clone();
    let engine = *engine.get_ref();
    let slug = slug.into_inner();
    let context = payload.into_inner().context;

    let outcome = web::block(move || -> Result<Preview, EngineError> {
        let conn = db::open(&db_path)?;
        if let Some(message) = engine.validate(&conn, &slug, &context)? {
            return Ok(Preview::Rejected(message));
        }
        Ok(Preview::Rendered(engine.render(&conn, &slug, &context)?))
    })
    .await;

    match outcome {
        Ok(Ok(Preview::Rendered(report))) => HttpResponse::Ok().json(report),
        Ok(Ok(Preview::Rejected(message))) => {
            HttpResponse::Ok().json(serde_json::json!({ "error": message }))
        }
        Ok(Err(EngineError::Template(e))) => {
            HttpResponse::InternalServerError().body(format!("Error rendering report: {}", e))
        }
        Ok(Err(e)) => {
            error!("Template preview failed: {}", e);
            HttpResponse::ServiceUnavailable().body(format!("Error previewing template: {}", e))
        }
        Err(e) => HttpResponse::ServiceUnavailable().body(format!("Error previewing template: {}", e)),
    }
}
