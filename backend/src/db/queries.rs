use common::model::template::ReportQuery;
use rusqlite::{params, Connection, OptionalExtension};

/// SQL text stored under `slug`, if any.
pub fn find_sql(conn: &Connection, slug: &str) -> rusqlite::Result<Option<String>> {
    conn.query_row(
        "SELECT sql_text FROM report_queries WHERE slug = ?1",
        params![slug],
        |row| row.get(0),
    )
    .optional()
}

pub fn find_query(conn: &Connection, slug: &str) -> rusqlite::Result<Option<ReportQuery>> {
    conn.query_row(
        "SELECT slug, sql_text, description FROM report_queries WHERE slug = ?1",
        params![slug],
        |row| {
            Ok(ReportQuery {
                slug: row.get(0)?,
                sql_text: row.get(1)?,
                description: row.get(2)?,
            })
        },
    )
    .optional()
}

pub fn upsert_query(conn: &Connection, query: &ReportQuery) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO report_queries (slug, sql_text, description) VALUES (?1, ?2, ?3)
         ON CONFLICT(slug) DO UPDATE SET sql_text = excluded.sql_text, description = excluded.description",
        params![&query.slug, &query.sql_text, &query.description],
    )?;
    Ok(())
}

/// Stores `query` only if its slug is free. Returns whether a row was inserted.
pub fn insert_query_if_missing(conn: &Connection, query: &ReportQuery) -> rusqlite::Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO report_queries (slug, sql_text, description) VALUES (?1, ?2, ?3)",
        params![&query.slug, &query.sql_text, &query.description],
    )?;
    Ok(inserted > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema;

    #[test]
    fn upsert_then_find() {
        let conn = Connection::open_in_memory().unwrap();
        schema::ensure_tables(&conn).unwrap();

        let mut query = ReportQuery {
            slug: "global_summary".to_string(),
            sql_text: "SELECT 1".to_string(),
            description: None,
        };
        upsert_query(&conn, &query).unwrap();
        query.sql_text = "SELECT 2".to_string();
        upsert_query(&conn, &query).unwrap();

        assert_eq!(find_sql(&conn, "global_summary").unwrap().as_deref(), Some("SELECT 2"));
        assert_eq!(find_sql(&conn, "nope").unwrap(), None);
        assert_eq!(find_query(&conn, "global_summary").unwrap(), Some(query));
    }
}
