mod api;
mod app;
mod application;
mod config;
mod domain;
mod ui;
mod utils;

use std::panic::{self, AssertUnwindSafe};
use std::process::ExitCode;
use std::thread;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::api::ApiClient;
use crate::application::ReadinessProbe;
use crate::config::{Cli, LauncherConfig};
use crate::domain::AppError;

fn init_tracing() {
    let filter = EnvFilter::try_from_env("DOCSHELL_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn launch(cli: Cli) -> Result<(), AppError> {
    let config = LauncherConfig::from_cli(cli)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("docshell-bridge")
        .build()
        .map_err(|e| AppError::Io(format!("Failed to start runtime: {}", e)))?;

    let probe = ReadinessProbe::new(ApiClient::new(config.backend.clone()));
    let ready = runtime.block_on(async {
        tokio::select! {
            ready = probe.wait_ready(config.health_attempts, config.health_delay) => Some(ready),
            _ = tokio::signal::ctrl_c() => None,
        }
    });

    match ready {
        Some(true) => app::run(config, runtime),
        Some(false) => Err(AppError::BackendUnavailable),
        None => {
            info!("Interrupted by user");
            Ok(())
        }
    }
}

/// Map the outcome of [`launch`] to the process status: 0 on success, 1 on
/// an error or a panic on the launching thread.
fn exit_status(outcome: thread::Result<Result<(), AppError>>) -> u8 {
    match outcome {
        Ok(Ok(())) => 0,
        Ok(Err(e)) => {
            error!("{}", e);
            1
        }
        Err(_) => {
            error!("Launcher panicked");
            1
        }
    }
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    ExitCode::from(exit_status(panic::catch_unwind(AssertUnwindSafe(|| {
        launch(cli)
    }))))
}
