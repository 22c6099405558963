use crate::config::AppConfig;
use crate::db::{self, templates};
use actix_web::{web, HttpResponse, Responder};
use common::model::template::ReportTemplate;
use log::{error, info};

pub(crate) async fn process(
    config: web::Data<AppConfig>,
    payload: web::Json<ReportTemplate>,
) -> impl Responder {
    let mut template = payload.into_inner();
    template.slug = template.slug.trim().to_string();
    if template.slug.is_empty() {
        return HttpResponse::BadRequest().body("Template slug must not be empty");
    }

    let db_path = config.db_path.clone();
    let slug = template.slug.clone();
    let outcome = web::block(move || -> rusqlite::Result<_> {
        let conn = db::open(&db_path)?;
        templates::upsert_template(&conn, &template)
    })
    .await;

    match outcome {
        Ok(Ok(())) => {
            info!("Template '{}' saved", slug);
            HttpResponse::Ok().body("Template saved")
        }
        Ok(Err(e)) => {
            error!("Saving template '{}' failed: {}", slug, e);
            HttpResponse::ServiceUnavailable().body(format!("Error saving template: {}", e))
        }
        Err(e) => HttpResponse::ServiceUnavailable().body(format!("Error saving template: {}", e)),
    }
}
