use bookmind::Result;
use bookmind::commands::{ServeOverrides, apply_overrides, load_config, serve_api};
use bookmind::config::show_config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bookmind")]
#[command(about = "Nearest-neighbor book recommendations over HTTP")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml and, by default, the data artifacts
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the artifacts and serve the recommendations API
    Serve {
        /// Address to bind, e.g. 127.0.0.1
        #[arg(long)]
        host: Option<String>,
        /// Port to bind
        #[arg(long)]
        port: Option<u16>,
        /// Path to the JSON metadata table
        #[arg(long)]
        metadata: Option<PathBuf>,
        /// Path to the Matrix Market feature matrix
        #[arg(long)]
        features: Option<PathBuf>,
    },
    /// Inspect configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config_dir)?;

    match cli.command {
        Commands::Serve {
            host,
            port,
            metadata,
            features,
        } => {
            apply_overrides(
                &mut config,
                ServeOverrides {
                    host,
                    port,
                    metadata,
                    features,
                },
            )?;
            serve_api(&config).await?;
        }
        Commands::Config { show } => {
            if show {
                show_config(&config)?;
            } else {
                println!("{}", config.config_file_path().display());
            }
        }
    }

    Ok(())
}
