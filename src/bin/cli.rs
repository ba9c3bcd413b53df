//! CLI for storing and fetching files

use clap::{Parser, Subcommand};
use minifs::common::format_bytes;
use minifs::FileClient;

#[derive(Parser)]
#[command(name = "minifs")]
#[command(about = "minifs distributed file store CLI")]
#[command(version)]
struct Cli {
    /// Coordinator URL
    #[arg(long, default_value = "http://127.0.0.1:8888")]
    coordinator: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a file
    Put {
        /// Name to store the file under
        name: String,

        /// File path
        #[arg(long)]
        file: std::path::PathBuf,
    },

    /// Fetch a file
    Get {
        /// Stored name
        name: String,

        /// Output file
        #[arg(long)]
        output: std::path::PathBuf,
    },

    /// Show registered nodes and stored file count
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let client = FileClient::new(cli.coordinator);

    match cli.command {
        Commands::Put { name, file } => {
            let data = tokio::fs::read(&file).await?;
            let size = data.len() as u64;
            client.put(&name, data).await?;
            println!("Stored {} ({})", name, format_bytes(size));
        }

        Commands::Get { name, output } => {
            let data = client.get(&name).await?;
            tokio::fs::write(&output, &data).await?;
            println!(
                "Fetched {} ({}) -> {}",
                name,
                format_bytes(data.len() as u64),
                output.display()
            );
        }

        Commands::Status => {
            let status = client.status().await?;
            println!("Cluster status:");
            println!("  Nodes: {}", status["nodes"]);
            println!("  Files: {}", status["files"]);
            println!("  Quorum: {}", status["quorum"]);
        }
    }

    Ok(())
}
