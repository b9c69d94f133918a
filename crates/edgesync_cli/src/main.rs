//! EdgeSync CLI
//!
//! Command-line tools for inspecting and exercising edge-to-cloud entity
//! replication.
//!
//! # Commands
//!
//! - `kinds` - List the entity kinds the standard registry handles
//! - `simulate` - Replicate scripted edge changes to an in-process cloud

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// EdgeSync command-line tools.
#[derive(Parser)]
#[command(name = "edgesync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered entity kinds
    Kinds {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Run an edge and a cloud node in-process and replicate scripted changes
    Simulate {
        /// Number of assets the edge creates
        #[arg(short, long, default_value = "5")]
        assets: usize,

        /// Outbound batch size
        #[arg(short, long, default_value = "50")]
        batch: usize,

        /// Send every follow-up request instead of merging pending ones
        #[arg(long)]
        no_coalesce: bool,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Kinds { format } => {
            commands::kinds::run(&format)?;
        }
        Commands::Simulate {
            assets,
            batch,
            no_coalesce,
            format,
        } => {
            let options = commands::simulate::Options {
                assets,
                batch,
                coalesce: !no_coalesce,
            };
            commands::simulate::run(&options, &format).await?;
        }
        Commands::Version => {
            println!("EdgeSync CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("EdgeSync Core v{}", edgesync_core::VERSION);
            println!("Protocol v{}", edgesync_protocol::PROTOCOL_VERSION);
        }
    }

    Ok(())
}
