//! Administration of the parameterized SQL behind each report.
//!
//! Report builders look their SQL up by slug on every request, so a query saved
//! here is used by the very next report.

mod get;
mod save;

use actix_web::web::{get, post, scope};
use actix_web::Scope;

const API_PATH: &str = "/api/queries";

/// Configures the `/api/queries` scope.
///
/// *   **`POST /save`**: upserts a `ReportQuery` by slug.
/// *   **`GET /{slug}`**: returns the stored query or `404`.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/save", post().to(save::process))
        .route("/{slug}", get().to(get::process))
}
