//! Coordinator binary

use clap::{Parser, Subcommand};
use minifs::{common::CoordinatorConfig, Config, Coordinator};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "minifs-coord")]
#[command(about = "minifs coordinator: accepts files and spreads their shards over storage nodes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start coordinator server
    Serve {
        /// Bind address for HTTP (default 127.0.0.1:8888)
        #[arg(long)]
        bind: Option<SocketAddr>,

        /// Per-attempt timeout for shard transfers, in milliseconds
        #[arg(long)]
        node_timeout_ms: Option<u64>,

        /// Log level (trace, debug, info, warn, error)
        #[arg(long)]
        log_level: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            bind,
            node_timeout_ms,
            log_level,
        } => {
            // File config first, CLI arguments take priority
            let config = Config::load()?;
            let log_level = log_level.unwrap_or_else(|| config.log_level.clone());

            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| log_level.into()),
                )
                .with(tracing_subscriber::fmt::layer())
                .init();

            let mut coord_config: CoordinatorConfig = config.coordinator.unwrap_or_default();
            if let Some(bind) = bind {
                coord_config.bind_addr = bind;
            }
            if let Some(ms) = node_timeout_ms {
                coord_config.node_timeout_ms = ms;
            }

            Coordinator::new(coord_config).serve().await?;
        }
    }

    Ok(())
}
