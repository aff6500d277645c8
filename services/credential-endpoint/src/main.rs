use actix_web::{middleware, web, App, HttpServer};
use anyhow::{anyhow, Context};
use credential_endpoint::{config::Config, handlers};
use dotenv::dotenv;
use ledger_core::{spawn_ledger_actor, Ledger};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(false)
        .json()
        .init();

    info!("Starting Credential Endpoint...");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().map_err(|e| anyhow!("Invalid configuration: {}", e))?;

    info!("Configuration loaded successfully");

    // Single writer for every worker
    let ledger = Ledger::open(&config.ledger).context("Failed to open ledger")?;
    let handle = spawn_ledger_actor(ledger, config.ledger.mailbox_capacity);
    let ledger_data = web::Data::new(handle.clone());

    info!(
        "Starting HTTP server on {}:{}",
        config.server.host, config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(ledger_data.clone())
            .wrap(middleware::Logger::default())
            .configure(handlers::configure_routes)
    })
    .workers(config.server.workers)
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await?;

    handle.shutdown().await?;
    info!("Credential Endpoint stopped");

    Ok(())
}
