//! Aggregation of per-job decisions into one summary per cycle.

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use keeper_common::metrics::CYCLE_DURATION_METRIC;

use crate::classify::{CleanupDecision, JobState};
use crate::delete::DeleteTally;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleStatus {
    Ok,
    /// The namespace could not be listed; nothing was classified or deleted.
    ListError,
}

impl CycleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleStatus::Ok => "OK",
            CycleStatus::ListError => "LIST_ERROR",
        }
    }
}

impl fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CycleResult {
    pub total_jobs: usize,
    pub successful_jobs: usize,
    pub failed_jobs: usize,
    pub eligible_jobs: usize,
    pub deleted_count: usize,
    pub error_count: usize,
    pub status: CycleStatus,
}

impl CycleResult {
    pub fn list_error() -> Self {
        CycleResult {
            total_jobs: 0,
            successful_jobs: 0,
            failed_jobs: 0,
            eligible_jobs: 0,
            deleted_count: 0,
            error_count: 0,
            status: CycleStatus::ListError,
        }
    }
}

pub fn summarize(total: usize, decisions: &[CleanupDecision], tally: &DeleteTally) -> CycleResult {
    let count = |state: JobState| decisions.iter().filter(|d| d.state == state).count();

    CycleResult {
        total_jobs: total,
        successful_jobs: count(JobState::Succeeded),
        failed_jobs: count(JobState::Failed),
        eligible_jobs: decisions.iter().filter(|d| d.eligible).count(),
        deleted_count: tally.deleted,
        error_count: tally.errors,
        status: CycleStatus::Ok,
    }
}

/// Write the cycle summary record and update the cycle metrics.
pub fn emit(namespace: &str, result: &CycleResult, elapsed: Duration) {
    let duration_ms = elapsed.as_millis() as u64;

    match result.status {
        CycleStatus::Ok => tracing::info!(
            task = "job-cleanup",
            namespace,
            status = result.status.as_str(),
            total_jobs = result.total_jobs,
            successful_jobs = result.successful_jobs,
            failed_jobs = result.failed_jobs,
            eligible_jobs = result.eligible_jobs,
            deleted = result.deleted_count,
            errors = result.error_count,
            duration_ms,
            "cleanup cycle complete"
        ),
        CycleStatus::ListError => tracing::error!(
            task = "job-cleanup",
            namespace,
            status = result.status.as_str(),
            total_jobs = result.total_jobs,
            successful_jobs = result.successful_jobs,
            failed_jobs = result.failed_jobs,
            eligible_jobs = result.eligible_jobs,
            deleted = result.deleted_count,
            errors = result.error_count,
            duration_ms,
            "cleanup cycle aborted, jobs could not be listed"
        ),
    }

    metrics::counter!("keeper_cycles_total", "status" => result.status.as_str()).increment(1);
    metrics::counter!("keeper_jobs_seen_total").increment(result.total_jobs as u64);
    metrics::counter!("keeper_jobs_deleted_total").increment(result.deleted_count as u64);
    metrics::counter!("keeper_job_delete_errors_total").increment(result.error_count as u64);
    metrics::histogram!(CYCLE_DURATION_METRIC).record(elapsed.as_secs_f64());
    metrics::gauge!("keeper_last_cycle_timestamp").set(Utc::now().timestamp() as f64);
}
