//! # Content Administration
//!
//! Manual corrections to the dataset without a full reseed. Routes live under
//! `/api/admin/content`:
//!
//! - `POST /add`: inserts or replaces one content row, creating its country and
//!   author on the fly.
//! - `POST /update`: changes `views`, `category` and/or `likes` of one row.
//! - `POST /delete`: removes one row together with its tags and sample comments.
//! - `GET /list?limit=N`: the first `N` rows by id (default 100, at most 500)
//!   with country code and author handle, plus the total row count.
//!
//! Successful calls answer `{ "success": true, "message": ... }`. Failures answer
//! `{ "error": ... }` with `404` for an unknown `content_id` and `400` otherwise.

mod add;
mod delete;
mod list;
mod update;

use crate::config::AppConfig;
use crate::db;
use actix_web::web::{self, get, post, scope};
use actix_web::{HttpResponse, Scope};
use common::model::content::AdminOutcome;
use log::{info, warn};
use rusqlite::Connection;
use thiserror::Error;

const API_PATH: &str = "/api/admin/content";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/add", post().to(add::process))
        .route("/update", post().to(update::process))
        .route("/delete", post().to(delete::process))
        .route("/list", get().to(list::process))
}

#[derive(Debug, Error)]
pub(crate) enum AdminError {
    #[error("{0}")]
    Database(#[from] rusqlite::Error),
    #[error("No fields to update")]
    NoFields,
    #[error("Content not found")]
    NotFound,
}

/// Applies `change` on the blocking pool with a connection of its own and
/// reports `message` on success.
async fn apply<F>(config: &AppConfig, message: &'static str, change: F) -> HttpResponse
where
    F: FnOnce(&mut Connection) -> Result<(), AdminError> + Send + 'static,
{
    let db_path = config.db_path.clone();
    let outcome = web::block(move || -> Result<(), AdminError> {
        let mut conn = db::open(&db_path)?;
        change(&mut conn)
    })
    .await;

    match outcome {
        Ok(Ok(())) => {
            info!("{}", message);
            HttpResponse::Ok().json(AdminOutcome {
                success: true,
                message: message.to_string(),
            })
        }
        Ok(Err(AdminError::NotFound)) => {
            HttpResponse::NotFound().json(serde_json::json!({ "error": AdminError::NotFound.to_string() }))
        }
        Ok(Err(e)) => {
            warn!("Content change rejected: {}", e);
            HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() }))
        }
        Err(e) => HttpResponse::ServiceUnavailable().body(format!("Admin worker unavailable: {}", e)),
    }
}
