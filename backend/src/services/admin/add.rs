use super::{apply, AdminError};
use crate::config::AppConfig;
use actix_web::{web, Responder};
use common::model::content::NewContent;
use rusqlite::{params, Connection};

const DEFAULT_TIER: &str = "Mid";

pub(crate) async fn process(
    config: web::Data<AppConfig>,
    payload: web::Json<NewContent>,
) -> impl Responder {
    let content = payload.into_inner();
    apply(&config, "Content added successfully", move |conn| {
        add_content(conn, &content)
    })
    .await
}

/// Inserts or replaces `content`. Unknown countries are created with their
/// code as name and unknown authors with the requested tier (`Mid` by default).
pub(crate) fn add_content(conn: &mut Connection, content: &NewContent) -> Result<(), AdminError> {
    let tx = conn.transaction()?;

    tx.execute(
        "INSERT OR IGNORE INTO Country (country_code, country_name) VALUES (?1, ?1)",
        params![&content.country_code],
    )?;
    let country_id: i64 = tx.query_row(
        "SELECT country_id FROM Country WHERE country_code = ?1",
        params![&content.country_code],
        |row| row.get(0),
    )?;

    tx.execute(
        "INSERT OR IGNORE INTO Author (author_handle, creator_tier) VALUES (?1, ?2)",
        params![
            &content.author_handle,
            content.creator_tier.as_deref().unwrap_or(DEFAULT_TIER)
        ],
    )?;
    let author_id: i64 = tx.query_row(
        "SELECT author_id FROM Author WHERE author_handle = ?1",
        params![&content.author_handle],
        |row| row.get(0),
    )?;

    let year_month: String = content
        .publish_date
        .as_deref()
        .unwrap_or_default()
        .chars()
        .take(7)
        .collect();
    tx.execute(
        "INSERT OR REPLACE INTO Content (
             content_id, platform, category, views, likes, country_id, author_id,
             publish_date_approx, year_month
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            &content.content_id,
            &content.platform,
            &content.category,
            content.views,
            content.likes,
            country_id,
            author_id,
            &content.publish_date,
            year_month
        ],
    )?;

    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::reports::fixtures;

    fn new_content(id: &str, country: &str, author: &str) -> NewContent {
        NewContent {
            content_id: id.to_string(),
            platform: "YouTube".to_string(),
            category: Some("Tech".to_string()),
            views: Some(100),
            likes: Some(10),
            country_code: country.to_string(),
            author_handle: author.to_string(),
            creator_tier: None,
            publish_date: Some("2025-04-01".to_string()),
        }
    }

    #[test]
    fn creates_missing_country_and_author() {
        let mut conn = fixtures::conn();
        add_content(&mut conn, &new_content("n1", "DE", "@new")).unwrap();

        let (name, tier, year_month): (String, String, String) = conn
            .query_row(
                "SELECT co.country_name, a.creator_tier, c.year_month
                 FROM Content c
                 JOIN Country co ON c.country_id = co.country_id
                 JOIN Author a ON c.author_id = a.author_id
                 WHERE c.content_id = 'n1'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(name, "DE");
        assert_eq!(tier, "Mid");
        assert_eq!(year_month, "2025-04");
    }

    #[test]
    fn reuses_known_country_and_replaces_content() {
        let mut conn = fixtures::conn();
        let mut content = new_content("c1", "US", "@micro");
        content.views = Some(9999);
        add_content(&mut conn, &content).unwrap();

        let (views, country): (i64, String) = conn
            .query_row(
                "SELECT c.views, co.country_name FROM Content c
                 JOIN Country co ON c.country_id = co.country_id
                 WHERE c.content_id = 'c1'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(views, 9999);
        assert_eq!(country, "United States");
        let countries: i64 = conn
            .query_row("SELECT COUNT(*) FROM Country", [], |row| row.get(0))
            .unwrap();
        assert_eq!(countries, 3);
    }
}
