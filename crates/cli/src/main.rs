//! `operation-orchestrator` CLI entry-point.
//!
//! Available sub-commands:
//! - `serve`   — start the operation service (API + recovery scanner).
//! - `migrate` — run pending database migrations.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use engine::{OperationProcessor, RecoveryScanner, StepSequence};
use users::HttpUserClient;

#[derive(Parser)]
#[command(
    name = "operation-orchestrator",
    about = "Durable multi-step operation service",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the operation service.
    Serve {
        #[arg(long, default_value = "0.0.0.0:8080")]
        bind: String,
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,
        /// Base URL of the user-record service.
        #[arg(long, env = "USER_SERVICE_URL")]
        user_service_url: String,
        /// Seconds between recovery scans for unfinished operations.
        #[arg(long, default_value_t = 5)]
        scan_interval: u64,
    },
    /// Run pending database migrations.
    Migrate {
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            bind,
            database_url,
            user_service_url,
            scan_interval,
        } => {
            let pool = store::create_pool(&database_url, 10)
                .await
                .context("failed to connect to database")?;
            store::run_migrations(&pool)
                .await
                .context("migration failed")?;

            let op_store: Arc<dyn store::OperationStore> = Arc::new(store::PgStore::new(pool));
            let user_client = Arc::new(HttpUserClient::new(user_service_url));

            let processor = Arc::new(OperationProcessor::new(
                op_store.clone(),
                user_client,
                StepSequence::standard(),
            ));

            // Recovery scanner: resumes operations left unfinished by a
            // previous process, stopped via the shutdown channel.
            let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
            let scanner = RecoveryScanner::new(
                op_store.clone(),
                processor.clone(),
                Duration::from_secs(scan_interval),
            );
            let scanner_task = tokio::spawn(scanner.run(shutdown_rx));

            let state = api::AppState {
                store: op_store,
                processor,
            };
            api::serve(&bind, state, async {
                let _ = tokio::signal::ctrl_c().await;
                info!("shutdown signal received");
            })
            .await
            .context("API server failed")?;

            let _ = shutdown_tx.send(true);
            scanner_task.await.context("scanner task panicked")?;
        }
        Command::Migrate { database_url } => {
            let pool = store::create_pool(&database_url, 2)
                .await
                .context("failed to connect to database")?;
            store::run_migrations(&pool)
                .await
                .context("migration failed")?;
            info!("Migrations applied successfully");
        }
    }

    Ok(())
}
