//! cnpj-dl binary
//!
//! Loads configuration (optionally from a TOML file given as the first
//! argument), runs the pipeline once, and maps the outcome to the process
//! exit status. A termination signal cancels the run; any in-flight partial
//! file is deleted before the process exits.

use cnpj_dl::{Config, Error, PipelineDriver};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    let driver = match PipelineDriver::new(config) {
        Ok(driver) => driver,
        Err(e) => {
            tracing::error!(error = %e, "failed to build pipeline");
            return ExitCode::FAILURE;
        }
    };

    let cancel = driver.cancellation_token();
    tokio::spawn(async move {
        wait_for_signal().await;
        cancel.cancel();
    });

    match driver.run().await {
        Ok(summary) => {
            for report in &summary.files {
                tracing::info!(file = %report.name, outcome = ?report.outcome, "manifest");
            }
            println!("{summary}");
            if summary.is_complete() {
                ExitCode::SUCCESS
            } else {
                tracing::error!(failed = summary.failed(), "run finished with failures");
                ExitCode::FAILURE
            }
        }
        Err(Error::Cancelled) => {
            tracing::warn!("run cancelled by signal");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!(error = %e, "run aborted");
            ExitCode::FAILURE
        }
    }
}

fn load_config() -> Result<Config, Error> {
    match std::env::args().nth(1) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)?;
            toml::from_str(&raw).map_err(|e| Error::Config {
                message: format!("invalid config file {path}: {e}"),
                key: None,
            })
        }
        None => Ok(Config::default()),
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let sigterm = signal(SignalKind::terminate());
    let sigint = signal(SignalKind::interrupt());

    match (sigterm, sigint) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("received SIGTERM"),
                _ = sigint.recv() => tracing::info!("received SIGINT"),
            }
        }
        _ => {
            // Restricted environments may refuse signal registration
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    tokio::signal::ctrl_c().await.ok();
}
