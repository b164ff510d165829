//! Construction of the single Kubernetes client shared by every cleanup cycle.
//!
//! Credentials are resolved from an ordered list of sources: in-cluster service account first,
//! then a kubeconfig file. The first source that yields a configuration wins.

use std::env;
use std::path::PathBuf;

use async_trait::async_trait;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::Client;
use thiserror::Error;
use tokio::sync::OnceCell;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{source_name} credentials unavailable: {reason}")]
    Credentials {
        source_name: &'static str,
        reason: String,
    },
    #[error("failed to build kubernetes client: {0}")]
    Client(#[from] kube::Error),
    #[error("no credential source succeeded: {}", .0.join("; "))]
    Exhausted(Vec<String>),
}

/// A place Kubernetes credentials can be loaded from.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn load(&self) -> Result<kube::Config, AuthError>;
}

/// The service account token and CA mounted into every pod.
pub struct InCluster;

#[async_trait]
impl CredentialSource for InCluster {
    fn name(&self) -> &'static str {
        "in-cluster"
    }

    async fn load(&self) -> Result<kube::Config, AuthError> {
        kube::Config::incluster().map_err(|e| AuthError::Credentials {
            source_name: self.name(),
            reason: e.to_string(),
        })
    }
}

/// A kubeconfig file on local disk, using its current context.
pub struct KubeconfigFile {
    path: PathBuf,
}

impl KubeconfigFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CredentialSource for KubeconfigFile {
    fn name(&self) -> &'static str {
        "kubeconfig"
    }

    async fn load(&self) -> Result<kube::Config, AuthError> {
        let credentials_error = |reason: String| AuthError::Credentials {
            source_name: "kubeconfig",
            reason: format!("{}: {}", self.path.display(), reason),
        };

        let kubeconfig =
            Kubeconfig::read_from(&self.path).map_err(|e| credentials_error(e.to_string()))?;

        kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .map_err(|e| credentials_error(e.to_string()))
    }
}

/// `$HOME/.kube/config`, or `.kube/config` relative to the working directory when `HOME` is unset.
pub fn default_kubeconfig_path() -> PathBuf {
    env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_default()
        .join(".kube")
        .join("config")
}

/// Builds the cluster client at most once and hands out clones of it afterwards.
///
/// Concurrent callers of `acquire` during the first construction wait for it to finish; later
/// callers get the built client without any locking.
pub struct ClientProvider {
    sources: Vec<Box<dyn CredentialSource>>,
    client: OnceCell<Client>,
}

impl ClientProvider {
    pub fn new(sources: Vec<Box<dyn CredentialSource>>) -> Self {
        Self {
            sources,
            client: OnceCell::new(),
        }
    }

    /// In-cluster credentials first, falling back to the kubeconfig at `kubeconfig_path`.
    pub fn in_cluster_or_kubeconfig(kubeconfig_path: impl Into<PathBuf>) -> Self {
        Self::new(vec![
            Box::new(InCluster),
            Box::new(KubeconfigFile::new(kubeconfig_path)),
        ])
    }

    pub async fn acquire(&self) -> Result<Client, AuthError> {
        self.client
            .get_or_try_init(|| self.build())
            .await
            .map(Client::clone)
    }

    /// Whether a client has already been built.
    pub fn is_ready(&self) -> bool {
        self.client.initialized()
    }

    async fn build(&self) -> Result<Client, AuthError> {
        let mut failures = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            match source.load().await {
                Ok(config) => {
                    tracing::info!(
                        source = source.name(),
                        cluster_url = %config.cluster_url,
                        "loaded kubernetes credentials"
                    );
                    return Ok(Client::try_from(config)?);
                }
                Err(e) => {
                    tracing::warn!(
                        source = source.name(),
                        error = %e,
                        "kubernetes credential source unavailable"
                    );
                    failures.push(e.to_string());
                }
            }
        }

        Err(AuthError::Exhausted(failures))
    }
}
