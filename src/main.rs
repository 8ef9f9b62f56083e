use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use channel_forge::{config::Config, web::WebServer};

#[derive(Parser)]
#[command(name = "channel-forge")]
#[command(version = "0.1.0")]
#[command(about = "Playlist ingestion and EPG correlation service")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    port: Option<u16>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_filter = if cli.log_level == "trace" {
        format!("channel_forge={},tower_http=trace", cli.log_level)
    } else {
        format!("channel_forge={}", cli.log_level)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting channel-forge v{}", env!("CARGO_PKG_VERSION"));

    std::env::set_var("CONFIG_FILE", &cli.config);
    let mut config = Config::load()?;
    info!("Configuration loaded from: {}", cli.config);

    if let Some(host) = cli.host {
        config.web.host = host;
    }
    if let Some(port) = cli.port {
        config.web.port = port;
    }

    if config.ingest.playlist_url.is_empty() {
        info!("No playlist URL configured; ingest triggers will be rejected");
    }
    if config.epg.url.is_empty() {
        info!("No EPG URL configured; EPG queries will be rejected");
    }

    let web_server = WebServer::new(config)?;
    web_server.serve().await?;

    Ok(())
}
