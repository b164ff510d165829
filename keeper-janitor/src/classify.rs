//! Decide, for one Job, whether it has outlived its retention threshold.

use std::fmt;

use chrono::{DateTime, Utc};
use keeper_common::job::JobSnapshot;

use crate::config::ThresholdConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobState {
    /// At least one pod is still running.
    Active,
    /// No pod has finished yet.
    Pending,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Active => "active",
            JobState::Pending => "pending",
            JobState::Succeeded => "succeeded",
            JobState::Failed => "failed",
        }
    }

    fn of(job: &JobSnapshot) -> Self {
        if job.active > 0 {
            JobState::Active
        } else if job.succeeded > 0 {
            JobState::Succeeded
        } else if job.failed > 0 {
            JobState::Failed
        } else {
            JobState::Pending
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CleanupReason {
    None,
    SuccessAgedOut,
    FailureAgedOut,
}

impl CleanupReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CleanupReason::None => "NONE",
            CleanupReason::SuccessAgedOut => "SUCCESS_AGED_OUT",
            CleanupReason::FailureAgedOut => "FAILURE_AGED_OUT",
        }
    }
}

impl fmt::Display for CleanupReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CleanupDecision {
    pub job: JobSnapshot,
    pub state: JobState,
    /// Minutes since completion (or start). `None` when the Job carries neither timestamp.
    pub age_minutes: Option<f64>,
    pub eligible: bool,
    pub reason: CleanupReason,
}

impl CleanupDecision {
    fn retain(job: &JobSnapshot, state: JobState, age_minutes: Option<f64>) -> Self {
        CleanupDecision {
            job: job.clone(),
            state,
            age_minutes,
            eligible: false,
            reason: CleanupReason::None,
        }
    }
}

/// Classify a Job against the retention thresholds. Pure: never deletes and never logs.
pub fn classify(
    job: &JobSnapshot,
    now: DateTime<Utc>,
    thresholds: &ThresholdConfig,
) -> CleanupDecision {
    let state = JobState::of(job);
    let age_minutes = job.reference_time().map(|reference| age_in_minutes(now, reference));

    if matches!(state, JobState::Active | JobState::Pending) {
        return CleanupDecision::retain(job, state, age_minutes);
    }

    let Some(age) = age_minutes else {
        return CleanupDecision::retain(job, state, None);
    };

    let success_aged_out = job.succeeded > 0 && age > thresholds.success_age_minutes;
    let failure_aged_out = job.failed > 0 && age > thresholds.failure_age_minutes;

    let reason = if failure_aged_out {
        CleanupReason::FailureAgedOut
    } else if success_aged_out {
        CleanupReason::SuccessAgedOut
    } else {
        CleanupReason::None
    };

    CleanupDecision {
        job: job.clone(),
        state,
        age_minutes: Some(age),
        eligible: reason != CleanupReason::None,
        reason,
    }
}

/// Clock skew can put the reference time in the future; such Jobs are zero minutes old.
fn age_in_minutes(now: DateTime<Utc>, reference: DateTime<Utc>) -> f64 {
    let millis = (now - reference).num_milliseconds().max(0);
    millis as f64 / 60_000.0
}
