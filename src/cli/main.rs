//! nutrition-insights binary: HTTP query server and dataset ingestion

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use nutrition_insights::cli::commands::ingest::{IngestArgs, handle_ingest};
use nutrition_insights::cli::commands::serve::handle_serve;
use nutrition_insights::config::AppConfig;

#[derive(Parser)]
#[command(name = "nutrition-insights")]
#[command(about = "Diet and macronutrient analytics: ingest datasets, serve cached results")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the query endpoints
    Serve {
        /// Override the listening port
        #[arg(short, long)]
        port: Option<u16>,

        /// Poll the raw container and ingest new or changed datasets
        #[arg(long)]
        watch: bool,
    },
    /// Upload a CSV dataset and run the pipeline on it
    Ingest {
        /// CSV file to ingest
        file: PathBuf,

        /// Blob name in the raw container (defaults to the file name)
        #[arg(long)]
        name: Option<String>,

        /// Print the ingest report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Serve { port, watch } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if watch {
                config.watch.enabled = true;
            }
            handle_serve(&config).await?;
        }
        Commands::Ingest { file, name, json } => {
            let args = IngestArgs { file, name, json };
            handle_ingest(&args, &config)
                .await
                .with_context(|| format!("Failed to ingest {}", args.file.display()))?;
        }
    }

    Ok(())
}
