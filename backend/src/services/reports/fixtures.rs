//! A small dataset the report tests run against.
//!
//! | id | platform | category | hashtag | views | ER   | eng total | e/1k | country | tier  | hour | day      | period  | trend     |
//! |----|----------|----------|---------|-------|------|-----------|------|---------|-------|------|----------|---------|-----------|
//! | c1 | TikTok   | Dance    | #dance  | 1000  | 0.10 | 100       | 100  | US      | Micro | 18   | Sunday   | Evening | Challenge |
//! | c2 | TikTok   | Comedy   | #fun    | 2500  | 0.05 | 150       | 50   | US      | Mid   | 9    | Monday   | Morning | Meme      |
//! | c3 | TikTok   | Dance    | #dance  | 2000  | 0.08 | 160       | 80   | GB      | Star  | 22   | Saturday | Night   | Challenge |
//! | c4 | YouTube  | Tech     | #tech   | 5000  | 0.04 | 200       | 40   | US      | Mid   | 9    | Tuesday  | Morning | Meme      |
//! | c5 | YouTube  | Music    | #music  | 500   | 0.06 | 30        | 60   | US      | Micro | 18   | Sunday   | Evening | Challenge |
//! | c6 | TikTok   | Dance    | #dance  | 4000  | 0.02 | 80        | 20   | JP      | Micro | 18   | Monday   | Evening | Challenge |
//!
//! c1 to c4 are published in 2025-01, c5 and c6 in 2025-02.

use crate::db::{defaults, schema};
use rusqlite::Connection;

const SAMPLE: &str = "
INSERT OR IGNORE INTO Country (country_id, country_code, country_name, region, language) VALUES
    (1, 'US', 'United States', 'North America', 'en'),
    (2, 'GB', 'United Kingdom', 'Europe', 'en'),
    (3, 'JP', 'Japan', 'Asia', 'ja');
INSERT OR IGNORE INTO Author (author_id, author_handle, creator_avg_views, creator_tier) VALUES
    (1, '@micro', 1500.0, 'Micro'),
    (2, '@mid', 3000.0, 'Mid'),
    (3, '@star', 9000.0, 'Star');
INSERT OR IGNORE INTO Device (device_id, device_type, device_brand, upload_hour, traffic_source, is_weekend) VALUES
    (1, 'Mobile', 'Apple', 9, 'ForYou', 0),
    (2, 'Mobile', 'Samsung', 18, 'Search', 0),
    (3, 'Desktop', 'Dell', 22, 'External', 1);
INSERT OR IGNORE INTO Trend (trend_id, trend_label, trend_type, trend_duration_days, engagement_velocity, source_hint) VALUES
    (1, 'Dance Off', 'Challenge', 7, 0.5, 'N/A'),
    (2, 'Cat Memes', 'Meme', 3, 0.8, 'N/A');
INSERT OR IGNORE INTO Content (
    content_id, platform, category, hashtag, views, likes, engagement_rate, engagement_total,
    engagement_per_1k, completion_rate, publish_date_approx, year_month, publish_dayofweek,
    publish_period, country_id, author_id, device_id, trend_id
) VALUES
    ('c1', 'TikTok', 'Dance', '#dance', 1000, 80, 0.10, 100, 100.0, 0.5, '2025-01-05', '2025-01', 'Sunday', 'Evening', 1, 1, 2, 1),
    ('c2', 'TikTok', 'Comedy', '#fun', 2500, 120, 0.05, 150, 50.0, 0.4, '2025-01-13', '2025-01', 'Monday', 'Morning', 1, 2, 1, 2),
    ('c3', 'TikTok', 'Dance', '#dance', 2000, 140, 0.08, 160, 80.0, 0.6, '2025-01-18', '2025-01', 'Saturday', 'Night', 2, 3, 3, 1),
    ('c4', 'YouTube', 'Tech', '#tech', 5000, 150, 0.04, 200, 40.0, 0.3, '2025-01-07', '2025-01', 'Tuesday', 'Morning', 1, 2, 1, 2),
    ('c5', 'YouTube', 'Music', '#music', 500, 20, 0.06, 30, 60.0, 0.7, '2025-02-02', '2025-02', 'Sunday', 'Evening', 1, 1, 2, 1),
    ('c6', 'TikTok', 'Dance', '#dance', 4000, 60, 0.02, 80, 20.0, 0.2, '2025-02-10', '2025-02', 'Monday', 'Evening', 3, 1, 2, 1);
";

/// Creates the tables, stores the default queries and templates and loads the sample rows.
pub(crate) fn prepare(conn: &Connection) {
    schema::ensure_tables(conn).unwrap();
    defaults::seed(conn).unwrap();
    conn.execute_batch(SAMPLE).unwrap();
}

pub(crate) fn conn() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    prepare(&conn);
    conn
}
