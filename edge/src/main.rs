use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use mentor_core::agents::config::parse_fallback_order;
use mentor_core::agents::EdgeConfig;
use mentor_core::api::{self, CorsPolicy};
use mentor_core::build_state;

/// HTTP edge for the mentor chat, hybrid teacher and speech endpoints.
#[derive(Debug, Parser)]
#[command(name = "mentor-edge", version)]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:8787")]
    bind: SocketAddr,
    /// Comma separated provider order used after a persona's preferred provider
    #[arg(long)]
    fallback_order: Option<String>,
    /// Per-call timeout for provider requests, in seconds
    #[arg(long)]
    provider_timeout_secs: Option<u64>,
    /// Extra domain (and its subdomains) allowed by CORS; repeatable
    #[arg(long = "allow-domain")]
    allow_domains: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::builder()
        .format_timestamp_millis()
        .parse_default_env()
        .init();

    let cli = Cli::parse();
    let mut config = EdgeConfig::from_env().context("failed to load configuration")?;
    if let Some(order) = cli.fallback_order.as_deref() {
        config.fallback_order = parse_fallback_order(order).context("invalid --fallback-order")?;
    }
    if let Some(secs) = cli.provider_timeout_secs {
        config.provider_timeout = Some(Duration::from_secs(secs));
    }

    let configured: Vec<_> = config.providers.iter().map(|p| p.kind.id()).collect();
    info!(
        "providers configured: [{}], speech configured: {}, fallback order: {:?}",
        configured.join(", "),
        config.speech.is_some(),
        config.fallback_order
    );
    if configured.is_empty() {
        warn!("no chat provider has a credential; chat endpoints will answer 500");
    }

    let cors_policy = cli
        .allow_domains
        .into_iter()
        .fold(CorsPolicy::default(), CorsPolicy::with_domain);
    let state = build_state(&config).context("failed to initialise providers")?;
    let app = api::router(state, cors_policy);

    let listener = tokio::net::TcpListener::bind(cli.bind)
        .await
        .with_context(|| format!("failed to bind {}", cli.bind))?;
    info!("listening on {}", cli.bind);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        warn!("could not install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
