use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use keeper_common::kubernetes::{JobApi, ListOptions};

use crate::classify::{classify, CleanupDecision};
use crate::config::ThresholdConfig;
use crate::delete::{delete_job, DeleteTally};
use crate::report::{self, CycleResult};

#[async_trait]
pub trait Cleaner: Send + Sync {
    /// Run one complete cleanup cycle and report it.
    async fn cleanup(&self) -> CycleResult;
}

/// Deletes finished Jobs of one namespace once they outlive their retention threshold.
pub struct JobCleaner<A> {
    api: A,
    thresholds: ThresholdConfig,
    list_options: ListOptions,
    dry_run: bool,
}

impl<A: JobApi> JobCleaner<A> {
    pub fn new(api: A, thresholds: ThresholdConfig, list_options: ListOptions) -> Self {
        Self {
            api,
            thresholds,
            list_options,
            dry_run: false,
        }
    }

    /// Classify and log eligible Jobs without deleting them.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }

    /// List, classify and delete, in listing order, as of `now`.
    pub async fn run_cycle(&self, now: DateTime<Utc>) -> CycleResult {
        let namespace = self.thresholds.namespace.as_str();

        let jobs = match self.api.list_jobs(namespace, &self.list_options).await {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::error!(task = "job-cleanup", error = %e, "failed to list jobs");
                return CycleResult::list_error();
            }
        };

        let mut decisions = Vec::with_capacity(jobs.len());
        let mut tally = DeleteTally::default();

        for job in &jobs {
            let decision = classify(job, now, &self.thresholds);

            if !decision.eligible {
                log_decision(&decision, "retain");
            } else if self.dry_run {
                log_decision(&decision, "dry_run");
            } else {
                let outcome = delete_job(&self.api, namespace, job).await;
                match &outcome {
                    Ok(deleted) => tracing::info!(
                        task = "job-cleanup",
                        job = %deleted.name,
                        status = decision.state.as_str(),
                        age_minutes = decision.age_minutes,
                        reason = decision.reason.as_str(),
                        action = "delete",
                        "deleted job"
                    ),
                    Err(e) => tracing::warn!(
                        task = "job-cleanup",
                        job = %decision.job.name,
                        status = decision.state.as_str(),
                        age_minutes = decision.age_minutes,
                        reason = decision.reason.as_str(),
                        action = "delete_failed",
                        error = %e,
                        "failed to delete job"
                    ),
                }
                tally.record(&outcome);
            }

            decisions.push(decision);
        }

        report::summarize(jobs.len(), &decisions, &tally)
    }
}

fn log_decision(decision: &CleanupDecision, action: &'static str) {
    tracing::info!(
        task = "job-cleanup",
        job = %decision.job.name,
        status = decision.state.as_str(),
        age_minutes = decision.age_minutes,
        reason = decision.reason.as_str(),
        action,
        "checked job"
    );
}

#[async_trait]
impl<A: JobApi> Cleaner for JobCleaner<A> {
    async fn cleanup(&self) -> CycleResult {
        let started = Instant::now();
        let result = self.run_cycle(Utc::now()).await;
        report::emit(&self.thresholds.namespace, &result, started.elapsed());
        result
    }
}
