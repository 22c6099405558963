use serde::{Deserialize, Serialize};

/// Lifecycle of a background job as seen by polling clients.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    /// Progress in percent.
    InProgress(u32),
    /// Human readable summary of what the job did.
    Completed(String),
    Failed(String),
}
