use crate::job_controller::state::JobsState;
use actix_web::{web, HttpResponse, Responder};

/// Current `JobStatus` of a reseed job, `404` for an id that was never issued.
pub(crate) async fn process(job_id: web::Path<String>, state: web::Data<JobsState>) -> impl Responder {
    let jobs = state.jobs.read().await;
    match jobs.get(job_id.as_str()) {
        Some(status) => HttpResponse::Ok().json(status),
        None => HttpResponse::NotFound().body("Job ID not found"),
    }
}
