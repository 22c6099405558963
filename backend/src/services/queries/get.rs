use crate::config::AppConfig;
use crate::db::{self, queries};
use actix_web::{web, HttpResponse, Responder};
use log::error;

pub(crate) async fn process(config: web::Data<AppConfig>, slug: web::Path<String>) -> impl Responder {
    let db_path = config.db_path.clone();
    let slug = slug.into_inner();
    let outcome = web::block(move || -> rusqlite::Result<_> {
        let conn = db::open(&db_path)?;
        queries::find_query(&conn, &slug)
    })
    .await;

    match outcome {
        Ok(Ok(Some(query))) => HttpResponse::Ok().json(query),
        Ok(Ok(None)) => HttpResponse::NotFound().body("Query not found"),
        Ok(Err(e)) => {
            error!("Reading report query failed: {}", e);
            HttpResponse::ServiceUnavailable().body(format!("Error retrieving query: {}", e))
        }
        Err(e) => HttpResponse::ServiceUnavailable().body(format!("Error retrieving query: {}", e)),
    }
}
