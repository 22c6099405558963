use super::read_catalog;
use crate::config::AppConfig;
use actix_web::{web, Responder};
use rusqlite::Connection;

pub(crate) async fn process(config: web::Data<AppConfig>) -> impl Responder {
    read_catalog(&config, list_platforms).await
}

fn list_platforms(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT DISTINCT platform FROM Content ORDER BY platform")?;
    let platforms = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;
    Ok(platforms)
}
