use rusqlite::Connection;

/// Dataset tables, filled by the reseed job and the content admin endpoints.
const DATASET_TABLES: &str = "
CREATE TABLE IF NOT EXISTS Country (
    country_id INTEGER PRIMARY KEY AUTOINCREMENT,
    country_code TEXT UNIQUE NOT NULL,
    country_name TEXT,
    region TEXT,
    language TEXT
);
CREATE TABLE IF NOT EXISTS Author (
    author_id INTEGER PRIMARY KEY AUTOINCREMENT,
    author_handle TEXT UNIQUE NOT NULL,
    creator_avg_views REAL,
    creator_tier TEXT
);
CREATE TABLE IF NOT EXISTS Device (
    device_id INTEGER PRIMARY KEY AUTOINCREMENT,
    device_type TEXT,
    device_brand TEXT,
    upload_hour INTEGER,
    traffic_source TEXT,
    is_weekend INTEGER
);
CREATE TABLE IF NOT EXISTS Trend (
    trend_id INTEGER PRIMARY KEY AUTOINCREMENT,
    trend_label TEXT,
    trend_type TEXT,
    trend_duration_days INTEGER,
    engagement_velocity REAL,
    source_hint TEXT
);
CREATE TABLE IF NOT EXISTS Content (
    content_id TEXT PRIMARY KEY,
    platform TEXT NOT NULL,
    category TEXT,
    hashtag TEXT,
    title TEXT,
    title_keywords TEXT,
    title_length INTEGER,
    has_emoji INTEGER,
    duration_sec INTEGER,
    views INTEGER,
    likes INTEGER,
    comments INTEGER,
    shares INTEGER,
    saves INTEGER,
    dislikes INTEGER,
    engagement_rate REAL,
    engagement_total INTEGER,
    like_rate REAL,
    dislike_rate REAL,
    engagement_per_1k REAL,
    engagement_like_rate REAL,
    engagement_comment_rate REAL,
    engagement_share_rate REAL,
    avg_watch_time_sec REAL,
    completion_rate REAL,
    publish_date_approx TEXT,
    year_month TEXT,
    publish_dayofweek TEXT,
    publish_period TEXT,
    event_season TEXT,
    season TEXT,
    week_of_year INTEGER,
    country_id INTEGER REFERENCES Country(country_id),
    author_id INTEGER REFERENCES Author(author_id),
    device_id INTEGER REFERENCES Device(device_id),
    trend_id INTEGER REFERENCES Trend(trend_id)
);
CREATE TABLE IF NOT EXISTS Content_Tags (
    tag_id INTEGER PRIMARY KEY AUTOINCREMENT,
    content_id TEXT NOT NULL REFERENCES Content(content_id),
    tag TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS Content_Comments (
    comment_id INTEGER PRIMARY KEY AUTOINCREMENT,
    content_id TEXT NOT NULL REFERENCES Content(content_id),
    sample_comment TEXT NOT NULL
);
";

/// Report queries and templates, both keyed by slug.
const REPORT_TABLES: &str = "
CREATE TABLE IF NOT EXISTS report_templates (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    slug TEXT UNIQUE NOT NULL,
    name TEXT NOT NULL,
    format TEXT NOT NULL CHECK(format IN ('text','markdown','html')),
    content TEXT NOT NULL,
    metadata TEXT,
    created_at TEXT DEFAULT CURRENT_TIMESTAMP,
    updated_at TEXT DEFAULT CURRENT_TIMESTAMP
);
CREATE TABLE IF NOT EXISTS report_queries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    slug TEXT UNIQUE NOT NULL,
    sql_text TEXT NOT NULL,
    description TEXT
);
";

/// Creates missing tables. Existing tables are left exactly as they are.
pub fn ensure_tables(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(DATASET_TABLES)?;
    conn.execute_batch(REPORT_TABLES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_tables_is_repeatable() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_tables(&conn).unwrap();
        ensure_tables(&conn).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('Content', 'report_templates', 'report_queries')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 3);
    }
}
