use std::process::ExitCode;
use std::sync::Arc;

use axum::Router;
use cleanup::JobCleaner;
use config::{Config, ConfigError};
use envconfig::Envconfig;
use eyre::{eyre, Result};
use futures::future::{select, Either};
use keeper_common::client::{AuthError, ClientProvider};
use keeper_common::kubernetes::KubeJobApi;
use keeper_common::metrics;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

mod classify;
mod cleanup;
mod config;
mod delete;
mod handlers;
#[cfg(test)]
mod log_capture;
mod report;
mod scheduler;

#[derive(Error, Debug)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Auth(#[from] AuthError),
}

async fn listen(app: Router, bind: String) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;

    axum::serve(listener, app).await?;

    Ok(())
}

/// Resolve the configuration and build the cluster client. Either failure is fatal.
async fn startup(
    config: &Config,
    provider: &ClientProvider,
) -> Result<JobCleaner<KubeJobApi>, StartupError> {
    let thresholds = config.thresholds()?;
    let list_options = config.list_options();

    tracing::info!(
        task = "job-cleanup",
        namespace = %thresholds.namespace,
        success_threshold_minutes = thresholds.success_age_minutes,
        failure_threshold_minutes = thresholds.failure_age_minutes,
        check_frequency_minutes = thresholds.cycle_interval_minutes,
        list_page_limit = list_options.page_limit,
        list_timeout_seconds = list_options.timeout_seconds,
        startup = ?config.startup_mode(),
        dry_run = config.dry_run,
        "configuration"
    );

    let client = provider.acquire().await?;

    let cleaner = JobCleaner::new(KubeJobApi::new(client), thresholds, list_options);

    Ok(cleaner.dry_run(config.dry_run))
}

/// Build the cleaner, then run cleanup cycles until the process is stopped.
async fn reconcile(config: &Config, provider: &ClientProvider) -> Result<()> {
    let cleaner = startup(config, provider).await?;
    let interval = cleaner.thresholds().cycle_interval();

    scheduler::cleanup_loop(cleaner, interval, config.startup_mode()).await
}

async fn run(config: Config) -> Result<()> {
    let provider = Arc::new(ClientProvider::in_cluster_or_kubeconfig(
        config.kubeconfig_path(),
    ));

    // The probes are served while credentials are still being resolved.
    let recorder_handle = metrics::setup_metrics_recorder()?;
    let app = handlers::app(provider.clone(), Some(recorder_handle));
    let http_server = Box::pin(listen(app, config.bind()));
    let cleanup_loop = Box::pin(reconcile(&config, &provider));

    let result = match select(http_server, cleanup_loop).await {
        Either::Left((listen_result, _)) => match listen_result {
            Ok(_) => Err(eyre!("keeper-janitor http server exited")),
            Err(e) => Err(e.wrap_err("failed to start keeper-janitor http server")),
        },
        Either::Right((cleanup_result, _)) => match cleanup_result {
            Ok(_) => Err(eyre!("keeper-janitor cleanup task exited")),
            Err(e) => Err(e.wrap_err("keeper-janitor cleanup task exited")),
        },
    };
    result
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(false)
        .init();

    let config = match Config::init_from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "failed to load configuration from env");
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(
                task = "job-cleanup",
                error = format!("{e:#}"),
                "keeper-janitor exiting"
            );
            ExitCode::FAILURE
        }
    }
}
