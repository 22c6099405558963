//! # Dataset Reseed Service
//!
//! This module provides the `POST /api/dataset/reseed` endpoint, which replaces
//! the whole dataset with the cleaned content of a CSV file.
//!
//! ## Workflow:
//!
//! 1.  **HTTP Request**: The `process` handler receives a `ReseedRequest`. Without
//!     `csv_path` the configured dataset file is used.
//!
//! 2.  **Job Scheduling**: `schedule_reseed_job` registers a new `job_id` as
//!     `Pending`, returns it to the client right away and spawns a Tokio task that
//!     owns the job's lifecycle.
//!
//! 3.  **Background Processing**: the task runs `reseed_blocking` through
//!     `tokio::task::spawn_blocking`, so file I/O and the bulk insert never block
//!     the server's async runtime.
//!
//! 4.  **Cleaning**: the CSV is read and cleaned by `clean::read_and_clean`.
//!
//! 5.  **Backup**: the database file is copied to `<db>.bak`.
//!
//! 6.  **Reseed**: in a single transaction the dataset tables are emptied and
//!     refilled: countries, authors, device variants and trend archetypes first,
//!     then content rows with their tags and sample comments. Any failure rolls
//!     the whole transaction back, leaving the previous data in place.
//!
//! 7.  **Progress Reporting**: the worker sends `ReseedUpdate`s that a listener
//!     task turns into `JobStatus::InProgress` percentages for the central job
//!     state. The final `Completed` / `Failed` status is set once the worker returns.

use super::clean::{self, CleanRecord, DeviceKey, TrendKey};
use crate::config::AppConfig;
use crate::db::{self, schema};
use crate::job_controller::state::{JobUpdate, JobsState};
use actix_web::{web, HttpResponse, Responder};
use common::jobs::JobStatus;
use common::requests::ReseedRequest;
use log::{error, info};
use rusqlite::{params, Connection, Transaction};
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Content rows inserted between two progress updates.
const PROGRESS_EVERY: usize = 1_000;

const DATASET_TABLES: [&str; 7] = [
    "Content_Tags",
    "Content_Comments",
    "Content",
    "Trend",
    "Device",
    "Author",
    "Country",
];

#[derive(Debug, Error)]
pub(crate) enum ReseedError {
    #[error("CSV file not found: {}", .0.display())]
    CsvNotFound(PathBuf),
    #[error("Database file not found: {}", .0.display())]
    DatabaseNotFound(PathBuf),
    #[error("No valid rows left after cleaning {}", .0.display())]
    NoRows(PathBuf),
    #[error("CSV read error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Database backup failed: {0}")]
    Backup(#[source] std::io::Error),
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("No {kind} row for '{key}'")]
    MissingReference { kind: &'static str, key: String },
}

/// Progress sent from the blocking worker to the job's listener task.
#[derive(Debug)]
pub(crate) enum ReseedUpdate {
    /// A fixed milestone, in percent.
    Stage(u32),
    /// Content rows inserted so far.
    Rows { done: usize, total: usize },
}

impl ReseedUpdate {
    /// Row insertion covers the 40% to 95% band of the job.
    fn percent(&self) -> u32 {
        match self {
            ReseedUpdate::Stage(pct) => *pct,
            ReseedUpdate::Rows { done, total } => {
                if *total == 0 {
                    95
                } else {
                    40 + (*done as f64 / *total as f64 * 55.0) as u32
                }
            }
        }
    }
}

/// Row counts of a finished reseed.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct ReseedSummary {
    pub countries: usize,
    pub authors: usize,
    pub devices: usize,
    pub trends: usize,
    pub content: usize,
    pub tags: usize,
    pub comments: usize,
    pub backup: PathBuf,
}

impl ReseedSummary {
    fn message(&self) -> String {
        format!(
            "Reseeded {} content rows ({} countries, {} authors, {} device variants, {} trend archetypes, {} tags, {} sample comments); backup saved to {}",
            self.content,
            self.countries,
            self.authors,
            self.devices,
            self.trends,
            self.tags,
            self.comments,
            self.backup.display()
        )
    }
}

pub(crate) async fn process(
    state: web::Data<JobsState>,
    config: web::Data<AppConfig>,
    payload: web::Json<ReseedRequest>,
) -> impl Responder {
    let csv_path = payload
        .into_inner()
        .csv_path
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| config.dataset_csv.clone());
    let job_id = schedule_reseed_job(state, csv_path, config.db_path.clone()).await;
    HttpResponse::Ok().json(serde_json::json!({ "job_id": job_id }))
}

/// Registers the job as `Pending` and runs the reseed in the background.
async fn schedule_reseed_job(state: web::Data<JobsState>, csv_path: PathBuf, db_path: PathBuf) -> String {
    let job_id = Uuid::new_v4().to_string();
    state
        .jobs
        .write()
        .await
        .insert(job_id.clone(), JobStatus::Pending);
    info!("Reseed job {} queued for {}", job_id, csv_path.display());

    let tx = state.tx.clone();
    let id = job_id.clone();
    tokio::spawn(async move {
        let (progress_tx, mut progress_rx) = mpsc::channel::<ReseedUpdate>(100);

        let listener_tx = tx.clone();
        let listener_id = id.clone();
        let listener = tokio::spawn(async move {
            while let Some(update) = progress_rx.recv().await {
                let _ = listener_tx
                    .send(JobUpdate {
                        job_id: listener_id.clone(),
                        status: JobStatus::InProgress(update.percent()),
                    })
                    .await;
            }
        });

        let handle =
            tokio::task::spawn_blocking(move || reseed_blocking(progress_tx, &csv_path, &db_path));

        let status = match handle.await {
            Ok(Ok(summary)) => {
                let message = summary.message();
                info!("Reseed job {} finished: {}", id, message);
                JobStatus::Completed(message)
            }
            Ok(Err(e)) => {
                error!("Reseed job {} failed: {}", id, e);
                JobStatus::Failed(e.to_string())
            }
            Err(e) => JobStatus::Failed(format!("Task join error: {}", e)),
        };
        // Pending progress must not overwrite the final status.
        let _ = listener.await;
        let _ = tx.send(JobUpdate { job_id: id, status }).await;
    });

    job_id
}

/// Cleans `csv_path`, backs up `db_path` and reseeds it. Meant for `spawn_blocking`.
pub(crate) fn reseed_blocking(
    tx: mpsc::Sender<ReseedUpdate>,
    csv_path: &Path,
    db_path: &Path,
) -> Result<ReseedSummary, ReseedError> {
    let _ = tx.blocking_send(ReseedUpdate::Stage(0));
    if !csv_path.exists() {
        return Err(ReseedError::CsvNotFound(csv_path.to_path_buf()));
    }
    if !db_path.exists() {
        return Err(ReseedError::DatabaseNotFound(db_path.to_path_buf()));
    }

    let file = File::open(csv_path).map_err(csv::Error::from)?;
    let records = clean::read_and_clean(file)?;
    info!("Cleaned dataset contains {} rows", records.len());
    if records.is_empty() {
        return Err(ReseedError::NoRows(csv_path.to_path_buf()));
    }
    let _ = tx.blocking_send(ReseedUpdate::Stage(20));

    let backup = backup_database(db_path).map_err(ReseedError::Backup)?;
    info!("Database backup saved to {}", backup.display());
    let _ = tx.blocking_send(ReseedUpdate::Stage(30));

    let mut conn = db::open(db_path)?;
    schema::ensure_tables(&conn)?;
    let mut summary = reseed(&mut conn, &records, &tx)?;
    summary.backup = backup;
    Ok(summary)
}

fn backup_database(db_path: &Path) -> std::io::Result<PathBuf> {
    let mut name = db_path.as_os_str().to_owned();
    name.push(".bak");
    let backup = PathBuf::from(name);
    std::fs::copy(db_path, &backup)?;
    Ok(backup)
}

/// Replaces the dataset tables with `records`. Nothing is kept on failure.
fn reseed(
    conn: &mut Connection,
    records: &[CleanRecord],
    progress: &mpsc::Sender<ReseedUpdate>,
) -> Result<ReseedSummary, ReseedError> {
    let tx = conn.transaction()?;
    clear_dataset(&tx)?;

    let countries = seed_countries(&tx, records)?;
    let authors = seed_authors(&tx, records)?;
    let devices = seed_devices(&tx, records)?;
    let trends = seed_trends(&tx, records)?;
    info!(
        "Inserted {} countries, {} authors, {} device variants, {} trend archetypes",
        countries.len(),
        authors.len(),
        devices.len(),
        trends.len()
    );
    let _ = progress.blocking_send(ReseedUpdate::Stage(40));

    let mut summary = ReseedSummary {
        countries: countries.len(),
        authors: authors.len(),
        devices: devices.len(),
        trends: trends.len(),
        ..ReseedSummary::default()
    };
    {
        let mut content_stmt = tx.prepare(
            "INSERT INTO Content (
                 content_id, platform, category, hashtag, title, title_keywords, title_length,
                 has_emoji, duration_sec, views, likes, comments, shares, saves, dislikes,
                 engagement_rate, engagement_total, like_rate, dislike_rate, engagement_per_1k,
                 engagement_like_rate, engagement_comment_rate, engagement_share_rate,
                 avg_watch_time_sec, completion_rate, publish_date_approx, year_month,
                 publish_dayofweek, publish_period, event_season, season, week_of_year,
                 country_id, author_id, device_id, trend_id
             ) VALUES (
                 ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18,
                 ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30, ?31, ?32, ?33, ?34, ?35, ?36
             )",
        )?;
        let mut tag_stmt = tx.prepare("INSERT INTO Content_Tags (content_id, tag) VALUES (?1, ?2)")?;
        let mut comment_stmt =
            tx.prepare("INSERT INTO Content_Comments (content_id, sample_comment) VALUES (?1, ?2)")?;

        for (i, r) in records.iter().enumerate() {
            let country_id = lookup(&countries, &r.country_code, "Country", || r.country_code.clone())?;
            let author_id = lookup(&authors, &r.author_handle, "Author", || r.author_handle.clone())?;
            let device_id = lookup(&devices, &r.device, "Device", || format!("{:?}", r.device))?;
            let trend_id = lookup(&trends, &r.trend, "Trend", || format!("{:?}", r.trend))?;

            content_stmt.execute(params![
                r.row_id,
                r.platform,
                r.category,
                r.hashtag,
                r.title,
                r.title_keywords,
                r.title_length,
                r.has_emoji,
                r.duration_sec,
                r.views,
                r.likes,
                r.comments,
                r.shares,
                r.saves,
                r.dislikes,
                r.engagement_rate,
                r.engagement_total,
                r.like_rate,
                r.dislike_rate,
                r.engagement_per_1k,
                r.engagement_like_rate,
                r.engagement_comment_rate,
                r.engagement_share_rate,
                r.avg_watch_time_sec,
                r.completion_rate,
                r.publish_date,
                r.year_month,
                r.publish_dayofweek,
                r.publish_period,
                r.event_season,
                r.season,
                r.week_of_year,
                country_id,
                author_id,
                device_id,
                trend_id
            ])?;
            summary.content += 1;

            for tag in &r.tags {
                tag_stmt.execute(params![r.row_id, tag])?;
                summary.tags += 1;
            }
            if !r.sample_comment.is_empty() {
                comment_stmt.execute(params![r.row_id, r.sample_comment])?;
                summary.comments += 1;
            }

            if (i + 1) % PROGRESS_EVERY == 0 {
                let _ = progress.blocking_send(ReseedUpdate::Rows {
                    done: i + 1,
                    total: records.len(),
                });
            }
        }
    }
    info!(
        "Inserted {} content rows, {} tags, {} sample comments",
        summary.content, summary.tags, summary.comments
    );

    tx.commit()?;
    let _ = progress.blocking_send(ReseedUpdate::Stage(100));
    Ok(summary)
}

fn lookup<K, F>(ids: &HashMap<K, i64>, key: &K, kind: &'static str, describe: F) -> Result<i64, ReseedError>
where
    K: std::hash::Hash + Eq,
    F: FnOnce() -> String,
{
    ids.get(key).copied().ok_or_else(|| ReseedError::MissingReference {
        kind,
        key: describe(),
    })
}

fn clear_dataset(tx: &Transaction) -> rusqlite::Result<()> {
    for table in DATASET_TABLES {
        tx.execute(&format!("DELETE FROM {}", table), [])?;
    }
    tx.execute(
        "DELETE FROM sqlite_sequence
         WHERE name IN ('Country', 'Author', 'Device', 'Trend', 'Content_Tags', 'Content_Comments')",
        [],
    )?;
    Ok(())
}

/// First occurrence of each country code wins.
fn seed_countries(tx: &Transaction, records: &[CleanRecord]) -> rusqlite::Result<HashMap<String, i64>> {
    let mut ids = HashMap::new();
    let mut stmt =
        tx.prepare("INSERT INTO Country (country_code, country_name, region, language) VALUES (?1, ?2, ?3, ?4)")?;
    for r in records {
        if ids.contains_key(&r.country_code) {
            continue;
        }
        stmt.execute(params![r.country_code, r.country_name, r.region, r.language])?;
        ids.insert(r.country_code.clone(), tx.last_insert_rowid());
    }
    Ok(ids)
}

fn seed_authors(tx: &Transaction, records: &[CleanRecord]) -> rusqlite::Result<HashMap<String, i64>> {
    let mut ids = HashMap::new();
    let mut stmt = tx.prepare(
        "INSERT INTO Author (author_handle, creator_avg_views, creator_tier) VALUES (?1, ?2, ?3)",
    )?;
    for r in records {
        if ids.contains_key(&r.author_handle) {
            continue;
        }
        stmt.execute(params![r.author_handle, r.creator_avg_views, r.creator_tier])?;
        ids.insert(r.author_handle.clone(), tx.last_insert_rowid());
    }
    Ok(ids)
}

fn seed_devices(tx: &Transaction, records: &[CleanRecord]) -> rusqlite::Result<HashMap<DeviceKey, i64>> {
    let mut ids = HashMap::new();
    let mut stmt = tx.prepare(
        "INSERT INTO Device (device_type, device_brand, upload_hour, traffic_source, is_weekend)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for r in records {
        if ids.contains_key(&r.device) {
            continue;
        }
        let d = &r.device;
        stmt.execute(params![d.device_type, d.device_brand, d.upload_hour, d.traffic_source, d.is_weekend])?;
        ids.insert(d.clone(), tx.last_insert_rowid());
    }
    Ok(ids)
}

/// Velocity and source hint come from the first row of each archetype.
fn seed_trends(tx: &Transaction, records: &[CleanRecord]) -> rusqlite::Result<HashMap<TrendKey, i64>> {
    let mut ids = HashMap::new();
    let mut stmt = tx.prepare(
        "INSERT INTO Trend (trend_label, trend_type, trend_duration_days, engagement_velocity, source_hint)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for r in records {
        if ids.contains_key(&r.trend) {
            continue;
        }
        let t = &r.trend;
        stmt.execute(params![
            t.trend_label,
            t.trend_type,
            t.trend_duration_days,
            r.engagement_velocity,
            r.source_hint
        ])?;
        ids.insert(t.clone(), tx.last_insert_rowid());
    }
    Ok(ids)
}
