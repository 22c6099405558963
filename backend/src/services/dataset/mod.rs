//! Rebuilds the dataset tables from the trends CSV.
//!
//! The reseed runs as a background job tracked by the shared `JobsState`
//! (`job_controller`), so the request returns at once with a `job_id`.
//!
//! The provided routes are:
//! - `POST /api/dataset/reseed`: starts a reseed from `csv_path` or, when the
//!   body names none, from the configured dataset file. Returns `{ "job_id": ... }`.
//!
//! - `GET /api/dataset/status/{job_id}`: polls the job. Returns the current
//!   `JobStatus` (`Pending`, `InProgress`, `Completed` or `Failed`).

use actix_web::web::{get, post, scope};
use actix_web::Scope;

mod clean;
mod get_status;
mod reseed;

const API_PATH: &str = "/api/dataset";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/reseed", post().to(reseed::process))
        .route("/status/{job_id}", get().to(get_status::process))
}
