use super::read_catalog;
use crate::config::AppConfig;
use actix_web::{web, Responder};
use common::model::catalog::CountryEntry;
use rusqlite::Connection;

pub(crate) async fn process(config: web::Data<AppConfig>) -> impl Responder {
    read_catalog(&config, list_countries).await
}

/// Countries referenced by at least one content row, ordered by code.
fn list_countries(conn: &Connection) -> rusqlite::Result<Vec<CountryEntry>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT c.country_code, c.country_name, c.region, c.language
         FROM Country c
         JOIN Content ct ON c.country_id = ct.country_id
         ORDER BY c.country_code",
    )?;
    let countries = stmt
        .query_map([], |row| {
            Ok(CountryEntry {
                code: row.get(0)?,
                name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                region: row.get(2)?,
                language: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(countries)
}
