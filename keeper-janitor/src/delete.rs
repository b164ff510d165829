use keeper_common::job::JobSnapshot;
use keeper_common::kubernetes::{DeleteError, JobApi};

/// A Job whose deletion the API accepted.
#[derive(Debug, PartialEq, Eq)]
pub struct Deleted {
    pub name: String,
}

/// Deletion outcomes of one cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeleteTally {
    pub deleted: usize,
    pub errors: usize,
}

impl DeleteTally {
    pub fn record(&mut self, outcome: &Result<Deleted, DeleteError>) {
        match outcome {
            Ok(_) => self.deleted += 1,
            Err(_) => self.errors += 1,
        }
    }
}

/// Delete one Job with background propagation. No retry: a rejected deletion is reported and
/// the Job is seen again by the next cycle if it still exists.
pub async fn delete_job<A>(
    api: &A,
    namespace: &str,
    job: &JobSnapshot,
) -> Result<Deleted, DeleteError>
where
    A: JobApi + ?Sized,
{
    api.delete_job(namespace, &job.name).await?;

    Ok(Deleted {
        name: job.name.clone(),
    })
}
