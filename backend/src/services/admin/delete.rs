use super::{apply, AdminError};
use crate::config::AppConfig;
use actix_web::{web, Responder};
use common::model::content::ContentDelete;
use rusqlite::{params, Connection};

pub(crate) async fn process(
    config: web::Data<AppConfig>,
    payload: web::Json<ContentDelete>,
) -> impl Responder {
    let content_id = payload.into_inner().content_id;
    apply(&config, "Content deleted successfully", move |conn| {
        delete_content(conn, &content_id)
    })
    .await
}

/// Removes the content row and the tags and comments attached to it.
pub(crate) fn delete_content(conn: &mut Connection, content_id: &str) -> Result<(), AdminError> {
    let tx = conn.transaction()?;
    tx.execute("DELETE FROM Content_Tags WHERE content_id = ?1", params![content_id])?;
    tx.execute("DELETE FROM Content_Comments WHERE content_id = ?1", params![content_id])?;
    let deleted = tx.execute("DELETE FROM Content WHERE content_id = ?1", params![content_id])?;
    if deleted == 0 {
        return Err(AdminError::NotFound);
    }
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::reports::fixtures;

    #[test]
    fn removes_content_and_its_tags() {
        let mut conn = fixtures::conn();
        conn.execute("INSERT INTO Content_Tags (content_id, tag) VALUES ('c3', 'dance')", [])
            .unwrap();
        delete_content(&mut conn, "c3").unwrap();
        let left: i64 = conn
            .query_row(
                "SELECT (SELECT COUNT(*) FROM Content WHERE content_id = 'c3')
                      + (SELECT COUNT(*) FROM Content_Tags WHERE content_id = 'c3')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(left, 0);
        assert!(matches!(delete_content(&mut conn, "c3"), Err(AdminError::NotFound)));
    }
}
