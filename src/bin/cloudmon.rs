//! cloudmon - publish in-process metrics to Cloud Monitoring
//!
//! # Usage
//! ```sh
//! CLOUDMON_PROJECT=my-project cargo run -- run
//! CLOUDMON_PROJECT=my-project cargo run -- list --custom-only
//! ```
//!
//! # Environment Variables
//! - `CLOUDMON_PROJECT` - Target project id (required)
//! - `CLOUDMON_ACCESS_TOKEN` - OAuth bearer token
//! - `CLOUDMON_INTERVAL_SECS` - Seconds between publishes (default: 60)
//! - `CLOUDMON_POLICY` - `full` or `count` meter breakdown (default: full)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cloudmon::application::MetricsReporter;
use cloudmon::application::admin::{delete_custom_descriptors, list_custom_descriptors};
use cloudmon::config::Config;
use cloudmon::domain::is_custom;
use cloudmon::domain::ports::MonitoringService;
use cloudmon::infrastructure::core::HttpClientSettings;
use cloudmon::infrastructure::{CloudMonitoringClient, InMemoryRegistry, SystemHostIdentity};
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Cloud Monitoring metrics publisher", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish process metrics until Ctrl+C
    Run,
    /// List metric descriptors in the project
    List {
        /// Only show descriptors under the custom metric domain
        #[arg(long)]
        custom_only: bool,
    },
    /// Delete one descriptor by fully qualified name
    Delete {
        name: String,
    },
    /// Delete every custom descriptor in the project
    Purge,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let project = config.require_project()?.to_string();

    let client = CloudMonitoringClient::new(
        &config.base_url,
        project.clone(),
        config.access_token.clone(),
        &HttpClientSettings::default(),
    )
    .context("Failed to create Cloud Monitoring client")?;

    match cli.command {
        Commands::Run => run(config, client).await?,
        Commands::List { custom_only } => {
            let descriptors = if custom_only {
                list_custom_descriptors(&client).await?
            } else {
                client.list_descriptors().await?
            };
            for d in descriptors {
                let marker = if is_custom(&d) { "*" } else { " " };
                println!("{} {} ({})", marker, d.name, d.value_kind);
            }
        }
        Commands::Delete { name } => {
            client.delete_descriptor(&name).await?;
            info!("Deleted {}", name);
        }
        Commands::Purge => {
            let report = delete_custom_descriptors(&client).await?;
            info!(
                "Purge complete: {} deleted, {} failed",
                report.deleted.len(),
                report.failed.len()
            );
            for (name, error) in &report.failed {
                warn!("Could not delete {}: {}", name, error);
            }
        }
    }

    Ok(())
}

async fn run(config: Config, client: CloudMonitoringClient) -> Result<()> {
    if !config.enabled {
        info!("Metrics reporting disabled (CLOUDMON_ENABLED=false).");
        return Ok(());
    }

    info!(
        "cloudmon {} publishing to project {} every {:?}",
        env!("CARGO_PKG_VERSION"),
        client.project(),
        config.interval
    );

    let registry = InMemoryRegistry::new();
    let heartbeat = registry
        .get_or_register_meter("cloudmon/heartbeat")
        .context("heartbeat meter name already taken")?;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(1));
        loop {
            ticker.tick().await;
            heartbeat.mark(1);
        }
    });

    let reporter = MetricsReporter::new(
        Arc::new(client),
        Arc::new(registry),
        Arc::new(SystemHostIdentity::new()),
        config.interval,
    )
    .with_policy(config.policy);

    reporter
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    info!("Shutdown signal received. Exiting...");
    Ok(())
}
