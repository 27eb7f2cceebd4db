//! Sitepulse CLI
//!
//! Runs the cached aggregation API, or queries a single upstream directly.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sitepulse_api::{normalize_listen, ApiConfig, ApiError, ApiServer, AppState};

/// Sitepulse - cached feeds and activity counts for a personal site
#[derive(Parser)]
#[command(name = "sitepulse")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API server (default)
    Serve {
        /// Bind address, overrides LISTEN
        #[arg(short, long)]
        listen: Option<String>,
    },

    /// Fetch one upstream, bypassing the cache, and print the route body
    Probe {
        /// Upstream to query
        #[arg(value_enum)]
        source: ProbeSource,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ProbeSource {
    /// Blog feed (/feed/blog)
    Blog,
    /// GitHub activity feed (/feed/github)
    GithubFeed,
    /// Misskey notes (/feed/misskey)
    MisskeyFeed,
    /// GitHub + Misskey activity (/count/activity)
    Activity,
    /// Starred repositories (/like/github)
    Stars,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    let config = resolve_config(ApiConfig::from_env())?;

    match cli.command.unwrap_or(Commands::Serve { listen: None }) {
        Commands::Serve { listen } => cmd_serve(config, listen).await,
        Commands::Probe { source } => cmd_probe(config, source).await,
    }
}

fn init_logging(verbose: bool, json: bool) {
    let filter = if verbose {
        "sitepulse=debug,tower_http=debug,info"
    } else {
        "sitepulse=info,warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into());

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn resolve_config<E>(loaded: std::result::Result<ApiConfig, E>) -> Result<ApiConfig>
where
    E: std::error::Error + Send + Sync + 'static,
{
    match loaded {
        Ok(config) => {
            info!(
                listen = %config.listen,
                github_user = %config.github.user,
                misskey = %config.misskey.instance_url,
                count_days = config.count_days,
                "Configuration loaded"
            );
            Ok(config)
        }
        Err(e) => {
            error!(error = %e, "Refusing to start");
            Err(e).context("Invalid configuration")
        }
    }
}

/// Run the API server
async fn cmd_serve(config: ApiConfig, listen: Option<String>) -> Result<()> {
    let listen = listen
        .map(|l| normalize_listen(&l))
        .unwrap_or_else(|| config.listen.clone());

    println!("{}", "Starting sitepulse API server...".cyan().bold());
    println!("   {} {}", "Listening on:".green(), listen);
    println!("   {} {}", "GitHub user:".dimmed(), config.github.user);
    println!("   {} {} days", "Activity window:".dimmed(), config.count_days);
    println!("\n   Press Ctrl+C to stop.\n");

    info!(%listen, "Starting server");

    ApiServer::new(config)
        .run(&listen)
        .await
        .with_context(|| format!("Server on {} failed", listen))
}

/// Query one upstream without caching
async fn cmd_probe(config: ApiConfig, source: ProbeSource) -> Result<()> {
    let state = AppState::new(config);

    println!("{} {:?}", "Probing".cyan().bold(), source);
    info!(?source, "Fetching upstream without cache");

    let started = std::time::Instant::now();
    let body = match source {
        ProbeSource::Blog => render(state.fetch_blog_feed().await),
        ProbeSource::GithubFeed => render(state.fetch_github_feed().await),
        ProbeSource::MisskeyFeed => render(state.fetch_misskey_feed().await),
        ProbeSource::Activity => render(state.fetch_activity().await),
        ProbeSource::Stars => render(state.fetch_github_stars().await),
    }?;

    println!("{}", body);
    println!("\n   {} {:?}", "Fetched in".dimmed(), started.elapsed());
    Ok(())
}

fn render<T: Serialize>(result: std::result::Result<T, ApiError>) -> Result<String> {
    let value = result.map_err(|e| anyhow::anyhow!("{}", e.message()))?;
    serde_json::to_string_pretty(&value).context("Failed to format response")
}
