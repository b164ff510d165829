use async_trait::async_trait;
use k8s_openapi::api::batch::v1::Job;
use kube::api::{Api, DeleteParams, ListParams};
use kube::Client;
use thiserror::Error;

use crate::job::JobSnapshot;

/// Optional knobs applied to every list request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Maximum number of Jobs fetched in one cycle. `None` fetches all of them.
    pub page_limit: Option<u32>,
    /// Server-side timeout for the list call, in seconds.
    pub timeout_seconds: Option<u32>,
}

impl ListOptions {
    fn params(&self) -> ListParams {
        let mut params = ListParams::default();
        if let Some(limit) = self.page_limit {
            params = params.limit(limit);
        }
        if let Some(timeout) = self.timeout_seconds {
            params = params.timeout(timeout);
        }
        params
    }
}

#[derive(Error, Debug)]
#[error("failed to list jobs in namespace {namespace}: {cause}")]
pub struct ListError {
    pub namespace: String,
    pub cause: String,
}

#[derive(Error, Debug)]
#[error("failed to delete job {name}: {cause}")]
pub struct DeleteError {
    pub name: String,
    pub cause: String,
}

/// The subset of the batch API a cleanup cycle needs.
#[async_trait]
pub trait JobApi: Send + Sync {
    /// List the Jobs of a namespace, in the order the API returns them.
    async fn list_jobs(
        &self,
        namespace: &str,
        options: &ListOptions,
    ) -> Result<Vec<JobSnapshot>, ListError>;

    /// Delete a Job with background propagation: returns as soon as the API accepts the request,
    /// the Job's pods are collected asynchronously.
    async fn delete_job(&self, namespace: &str, name: &str) -> Result<(), DeleteError>;
}

/// A `JobApi` backed by a live cluster connection.
#[derive(Clone)]
pub struct KubeJobApi {
    client: Client,
}

impl KubeJobApi {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn jobs(&self, namespace: &str) -> Api<Job> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl JobApi for KubeJobApi {
    async fn list_jobs(
        &self,
        namespace: &str,
        options: &ListOptions,
    ) -> Result<Vec<JobSnapshot>, ListError> {
        let jobs = self
            .jobs(namespace)
            .list(&options.params())
            .await
            .map_err(|e| ListError {
                namespace: namespace.to_owned(),
                cause: e.to_string(),
            })?;

        Ok(jobs.items.iter().map(JobSnapshot::from).collect())
    }

    async fn delete_job(&self, namespace: &str, name: &str) -> Result<(), DeleteError> {
        self.jobs(namespace)
            .delete(name, &DeleteParams::background())
            .await
            .map(|_| ())
            .map_err(|e| DeleteError {
                name: name.to_owned(),
                cause: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_list_options_are_unbounded() {
        let params = ListOptions::default().params();

        assert_eq!(params.limit, None);
        assert_eq!(params.timeout, None);
    }

    #[test]
    fn test_list_options_set_limit_and_timeout() {
        let options = ListOptions {
            page_limit: Some(200),
            timeout_seconds: Some(30),
        };
        let params = options.params();

        assert_eq!(params.limit, Some(200));
        assert_eq!(params.timeout, Some(30));
    }

    #[test]
    fn test_errors_name_the_target() {
        let list = ListError {
            namespace: "batch".to_owned(),
            cause: "connection refused".to_owned(),
        };
        let delete = DeleteError {
            name: "nightly-report".to_owned(),
            cause: "not found".to_owned(),
        };

        assert_eq!(
            list.to_string(),
            "failed to list jobs in namespace batch: connection refused"
        );
        assert_eq!(
            delete.to_string(),
            "failed to delete job nightly-report: not found"
        );
    }
}
