use crate::config::AppConfig;
use crate::db::{self, queries};
use actix_web::{web, HttpResponse, Responder};
use common::model::template::ReportQuery;
use log::{error, info};

pub(crate) async fn process(
    config: web::Data<AppConfig>,
    payload: web::Json<ReportQuery>,
) -> impl Responder {
    let mut query = payload.into_inner();
    query.slug = query.slug.trim().to_string();
    if query.slug.is_empty() || query.sql_text.trim().is_empty() {
        return HttpResponse::BadRequest().body("Query slug and SQL text must not be empty");
    }

    let db_path = config.db_path.clone();
    let slug = query.slug.clone();
    let outcome = web::block(move || -> rusqlite::Result<_> {
        let conn = db::open(&db_path)?;
        queries::upsert_query(&conn, &query)
    })
    .await;

    match outcome {
        Ok(Ok(())) => {
            info!("Report query '{}' saved", slug);
            HttpResponse::Ok().body("Query saved")
        }
        Ok(Err(e)) => {
            error!("Saving report query '{}' failed: {}", slug, e);
            HttpResponse::ServiceUnavailable().body(format!("Error saving query: {}", e))
        }
        Err(e) => HttpResponse::ServiceUnavailable().body(format!("Error saving query: {}", e)),
    }
}
