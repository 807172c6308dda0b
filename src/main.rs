use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use object_store::local::LocalFileSystem;
use object_store::ObjectStore;
use speedstats::{init_logging, serve, Config, PreprocessInputs, Preprocessor};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "speedstats")]
#[command(about = "Speed test summarizer and chart data server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Summarize raw exports into processed/ under the data directory
    Preprocess {
        /// M-Lab NDT export, relative to the data directory
        #[arg(long)]
        mlab: Option<String>,

        /// Cloudflare speed test export, relative to the data directory
        #[arg(long)]
        cloudflare: Option<String>,

        /// Cloudflare state-level export used for regional means
        #[arg(long)]
        regional: Option<String>,

        /// Starlink per-state metrics export (monthly medians)
        #[arg(long)]
        starlink_states: Option<String>,

        /// Country whose regions are averaged
        #[arg(long, default_value = speedstats::DEFAULT_COUNTRY)]
        country: String,
    },
    /// Start the API server
    Serve {
        #[arg(short, long, default_value = "50001")]
        port: u16,

        #[arg(short = 'b', long, default_value = "127.0.0.1")]
        host: String,
    },
}

fn open_store(config: &Config) -> Result<Arc<dyn ObjectStore>> {
    if !config.data_dir.exists() {
        std::fs::create_dir_all(&config.data_dir)
            .with_context(|| format!("creating {:?}", config.data_dir))?;
        info!("Created directory: {:?}", config.data_dir);
    }

    Ok(Arc::new(LocalFileSystem::new_with_prefix(&config.data_dir)?))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let config = Config::from_env()?;
    init_logging(config.log_level);

    let cli = Cli::parse();
    let store = open_store(&config)?;

    match cli.command {
        Commands::Preprocess {
            mlab,
            cloudflare,
            regional,
            starlink_states,
            country,
        } => {
            let inputs = PreprocessInputs {
                mlab,
                cloudflare,
                regional,
                starlink_states,
                country,
            };
            Preprocessor::new(store, &config)
                .run(&inputs)
                .await
                .context("preprocessing failed")?;
        }
        Commands::Serve { host, port } => {
            info!("Starting API server using data from {:?}", config.data_dir);
            serve(host, port, store, config).await?;
        }
    }

    Ok(())
}
