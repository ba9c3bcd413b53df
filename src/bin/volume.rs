use anyhow::Result;
use clap::Parser;
use minifs::{common::VolumeConfig, Config, VolumeServer};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "minifs-volume")]
#[command(about = "minifs storage node - stores shards as flat files")]
struct Args {
    /// Node ID, exactly 4 characters, unique across the cluster
    #[arg(short, long)]
    id: Option<String>,

    /// Address to listen on
    #[arg(short, long)]
    addr: Option<SocketAddr>,

    /// Coordinator URL to register with (empty string: do not register)
    #[arg(short, long)]
    coordinator: Option<String>,

    /// Existing, writable directory for shard files. Give each node on a host
    /// its own directory.
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::load()?;
    let log_level = args.log_level.unwrap_or_else(|| config.log_level.clone());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut volume_config: VolumeConfig = config.volume.unwrap_or_default();
    if let Some(addr) = args.addr {
        volume_config.bind_addr = addr;
    }
    if let Some(coordinator) = args.coordinator {
        volume_config.coordinator_url = coordinator;
    }
    if let Some(data_dir) = args.data_dir {
        volume_config.data_path = data_dir;
    }
    let node_id = args.id.unwrap_or(config.node_id);

    let server = VolumeServer::new(node_id, volume_config)?;
    server.serve().await?;

    Ok(())
}
