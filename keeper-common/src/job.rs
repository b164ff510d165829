use chrono::{DateTime, Utc};
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::ResourceExt;

/// A batch Job as observed when the namespace was listed.
///
/// Snapshots are only valid for the cycle that fetched them: the Job may already be gone by the
/// time a deletion is attempted.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JobSnapshot {
    pub name: String,
    /// Number of pods still running.
    pub active: u32,
    /// Number of pods that reached phase Succeeded.
    pub succeeded: u32,
    /// Number of pods that reached phase Failed.
    pub failed: u32,
    pub completion_time: Option<DateTime<Utc>>,
    pub start_time: Option<DateTime<Utc>>,
}

impl JobSnapshot {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..JobSnapshot::default()
        }
    }

    /// The timestamp a Job's age is measured from: its completion time, or its start time when
    /// it never completed.
    pub fn reference_time(&self) -> Option<DateTime<Utc>> {
        self.completion_time.or(self.start_time)
    }
}

impl From<&Job> for JobSnapshot {
    fn from(job: &Job) -> Self {
        let status = job.status.as_ref();

        JobSnapshot {
            name: job.name_any(),
            active: pod_count(status.and_then(|s| s.active)),
            succeeded: pod_count(status.and_then(|s| s.succeeded)),
            failed: pod_count(status.and_then(|s| s.failed)),
            completion_time: status.and_then(|s| to_utc(s.completion_time.as_ref())),
            start_time: status.and_then(|s| to_utc(s.start_time.as_ref())),
        }
    }
}

fn pod_count(count: Option<i32>) -> u32 {
    count.map_or(0, |c| u32::try_from(c).unwrap_or(0))
}

fn to_utc(time: Option<&Time>) -> Option<DateTime<Utc>> {
    time.map(|t| t.0)
}
