use anyhow::Context;
use dotenv::dotenv;
use roster_reconciler::{run, Config, ReconcileReport, SyncError};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load environment variables
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    match sync().await {
        Ok(report) => {
            info!(
                created = report.created.len(),
                skipped = report.skipped.len(),
                failed = report.failed.len(),
                "Bot script finished."
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            let kind = e
                .downcast_ref::<SyncError>()
                .map(SyncError::kind)
                .unwrap_or("startup");
            error!(kind, "Roster sync aborted: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn sync() -> anyhow::Result<ReconcileReport> {
    let config = Config::from_env().context("Failed to load configuration")?;
    info!("Configuration loaded successfully");

    Ok(run(&config).await?)
}
