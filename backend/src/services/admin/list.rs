use crate::config::AppConfig;
use crate::db;
use actix_web::{web, HttpResponse, Responder};
use common::model::content::{ContentListing, ContentRow};
use log::error;
use rusqlite::{params, Connection};
use serde::Deserialize;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub(crate) struct ListParams {
    limit: Option<i64>,
}

pub(crate) async fn process(
    config: web::Data<AppConfig>,
    params: web::Query<ListParams>,
) -> impl Responder {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let db_path = config.db_path.clone();
    let outcome = web::block(move || -> rusqlite::Result<ContentListing> {
        let conn = db::open(&db_path)?;
        list_content(&conn, limit)
    })
    .await;

    match outcome {
        Ok(Ok(listing)) => HttpResponse::Ok().json(listing),
        Ok(Err(e)) => {
            error!("Content listing failed: {}", e);
            HttpResponse::ServiceUnavailable().body(format!("Error listing content: {}", e))
        }
        Err(e) => HttpResponse::ServiceUnavailable().body(format!("Admin worker unavailable: {}", e)),
    }
}

/// Up to `limit` content rows ordered by id, with their country code and
/// author handle.
pub(crate) fn list_content(conn: &Connection, limit: i64) -> rusqlite::Result<ContentListing> {
    let mut stmt = conn.prepare(
        "SELECT c.content_id, c.platform, c.category, c.views, c.likes,
                co.country_code, a.author_handle, c.publish_date_approx
         FROM Content c
         LEFT JOIN Country co ON c.country_id = co.country_id
         LEFT JOIN Author a ON c.author_id = a.author_id
         ORDER BY c.content_id
         LIMIT ?1",
    )?;
    let content = stmt
        .query_map(params![limit], |row| {
            Ok(ContentRow {
                content_id: row.get(0)?,
                platform: row.get(1)?,
                category: row.get(2)?,
                views: row.get(3)?,
                likes: row.get(4)?,
                country_code: row.get(5)?,
                author_handle: row.get(6)?,
                publish_date: row.get(7)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    let total = conn.query_row("SELECT COUNT(*) FROM Content", [], |row| row.get(0))?;
    Ok(ContentListing { content, total })
}
