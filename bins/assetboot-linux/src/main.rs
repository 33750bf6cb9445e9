use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use assetboot_core::{LoaderSettings, SessionConfig, StrategyKind};
use assetboot_host::HostState;
use assetboot_loader::{Bootstrapper, HttpFetcher, ProcMeminfoSampler};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Bootstrap the web UI libraries, or host a local asset tree.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load every library and the app module as the page at PAGE_URL would.
    Boot {
        /// Page URL; a `mode` query parameter selects local, cdn or auto.
        page_url: String,

        /// JSON settings file.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Overrides the strategy from the settings file.
        #[arg(short, long)]
        strategy: Option<StrategyKind>,

        /// Print the resulting document as JSON.
        #[arg(long)]
        print_document: bool,
    },
    /// Serve an asset tree laid out like the device's filesystem.
    Serve {
        /// Asset root containing css/, js/, html/, ...
        root: PathBuf,

        #[arg(short, long, default_value = "0.0.0.0:8080")]
        bind: SocketAddr,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,assetboot_loader=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    match args.command {
        Command::Boot {
            page_url,
            config,
            strategy,
            print_document,
        } => boot(&page_url, config, strategy, print_document).await,
        Command::Serve { root, bind } => serve(root, bind).await,
    }
}

async fn boot(
    page_url: &str,
    config: Option<PathBuf>,
    strategy: Option<StrategyKind>,
    print_document: bool,
) -> anyhow::Result<()> {
    let mut settings = match &config {
        Some(path) => LoaderSettings::from_file(path)
            .with_context(|| format!("reading settings from {}", path.display()))?,
        None => LoaderSettings::default(),
    };
    if let Some(strategy) = strategy {
        settings.strategy = strategy;
    }

    let config = SessionConfig::resolve(settings, page_url)?;
    tracing::info!(
        "Bootstrapping {} in {} mode ({} strategy)",
        config.page_url,
        config.mode,
        config.strategy
    );

    let fetcher = HttpFetcher::new(config.page_url.clone())?;
    let boot = Bootstrapper::from_config(config, Arc::new(fetcher), ProcMeminfoSampler::detect());

    // Failures are already logged by the bootstrapper.
    let result = boot.run().await;

    if print_document {
        let document = boot.document().lock().await;
        println!("{}", serde_json::to_string_pretty(&*document)?);
    }

    if result.is_err() {
        std::process::exit(1);
    }
    Ok(())
}

async fn serve(root: PathBuf, bind: SocketAddr) -> anyhow::Result<()> {
    let state = HostState::new(root).into_shared();
    let (addr, server) = assetboot_host::bind(bind, state).await?;
    tracing::info!("Asset host ready on http://{}", addr);

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        result = server => {
            result?;
            tracing::warn!("Asset host stopped");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
