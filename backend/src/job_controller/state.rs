//! Shared state of background jobs.
//!
//! Only the dataset reseed (`services::dataset::reseed`) runs outside the
//! request/response cycle. Its progress flows through here:
//!
//! - `JobsState`: clonable handle to every job's status, injected into the Actix
//!   application in `main.rs` and read by `GET /api/dataset/status/{job_id}`.
//! - `JobUpdate`: a status change sent by a job.
//! - `start_job_updater`: the single writer that applies `JobUpdate`s to the map.
//!   Only the most recent `MAX_FINISHED_JOBS` completed or failed jobs are kept.

use common::jobs::JobStatus;
use log::debug;
use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};
use tokio::sync::{mpsc, RwLock};

const MAX_FINISHED_JOBS: usize = 20;

#[derive(Clone)]
pub struct JobsState {
    /// Job id to its latest status. Handlers register new jobs as `Pending`;
    /// every later change goes through `tx`.
    pub jobs: Arc<RwLock<HashMap<String, JobStatus>>>,

    /// Feeds `start_job_updater`, so that a worker can report progress without
    /// holding the write lock.
    pub tx: mpsc::Sender<JobUpdate>,
}

#[derive(Debug)]
pub struct JobUpdate {
    pub(crate) job_id: String,
    pub(crate) status: JobStatus,
}

/// Applies `JobUpdate`s until every sender is gone. Spawned once at startup.
pub async fn start_job_updater(state: JobsState, rx: mpsc::Receiver<JobUpdate>) {
    apply_updates(state, rx, MAX_FINISHED_JOBS).await;
}

async fn apply_updates(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>, keep_finished: usize) {
    let mut finished: VecDeque<String> = VecDeque::new();
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        let done = is_finished(&update.status);
        let was_done = jobs.get(&update.job_id).is_some_and(is_finished);
        if done && !was_done {
            finished.push_back(update.job_id.clone());
        }
        jobs.insert(update.job_id, update.status);

        while finished.len() > keep_finished {
            if let Some(oldest) = finished.pop_front() {
                debug!("Forgetting finished job {}", oldest);
                jobs.remove(&oldest);
            }
        }
    }
}

fn is_finished(status: &JobStatus) -> bool {
    matches!(status, JobStatus::Completed(_) | JobStatus::Failed(_))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(job_id: &str, status: JobStatus) -> JobUpdate {
        JobUpdate {
            job_id: job_id.to_string(),
            status,
        }
    }

    #[actix_web::test]
    async fn keeps_only_the_latest_finished_jobs() {
        let (tx, rx) = mpsc::channel(16);
        for job in [
            update("a", JobStatus::Completed("ok".to_string())),
            update("b", JobStatus::InProgress(40)),
            update("c", JobStatus::Failed("boom".to_string())),
            update("c", JobStatus::Failed("boom".to_string())),
            update("d", JobStatus::Completed("ok".to_string())),
        ] {
            tx.send(job).await.unwrap();
        }
        drop(tx);

        let jobs = Arc::new(RwLock::new(HashMap::new()));
        let state = JobsState {
            jobs: jobs.clone(),
            tx: mpsc::channel(1).0,
        };
        apply_updates(state, rx, 2).await;

        let jobs = jobs.read().await;
        assert!(!jobs.contains_key("a"));
        assert_eq!(jobs.get("b"), Some(&JobStatus::InProgress(40)));
        assert_eq!(jobs.get("c"), Some(&JobStatus::Failed("boom".to_string())));
        assert_eq!(jobs.get("d"), Some(&JobStatus::Completed("ok".to_string())));
    }
}
