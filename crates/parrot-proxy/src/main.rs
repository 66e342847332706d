use anyhow::Context;
use clap::Parser;
use parrot_proxy::config::Config;
use parrot_proxy::filters::Filters;
use parrot_proxy::proxy::{HyperOutboundClient, MetricsServer, ProxyHandler, ProxyServer};
use parrot_proxy::recording::RequestLog;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "parrot-proxy", version, about)]
struct Args {
    /// Port for proxied traffic and control requests
    #[arg(short, long, env = "PARROT_PORT")]
    port: Option<u16>,
    /// YAML configuration file
    #[arg(short, long, env = "PARROT_CONFIG")]
    config: Option<String>,
    /// Log filter used when RUST_LOG is not set
    #[arg(long, env = "PARROT_LOG_LEVEL")]
    log_level: Option<String>,
    /// Serve Prometheus metrics on this port
    #[arg(long, env = "PARROT_METRICS_PORT")]
    metrics_port: Option<u16>,
}

fn load_config(args: &Args) -> Result<Config, anyhow::Error> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(port) = args.port {
        config.listen.port = port;
    }
    if let Some(port) = args.metrics_port {
        config.metrics.get_or_insert_with(Default::default).port = port;
    }
    if let Some(level) = &args.log_level {
        config.log_level = Some(level.clone());
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn init_tracing(level: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.unwrap_or("info")));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    let config = load_config(&args)?;
    init_tracing(config.log_level.as_deref());

    let client = HyperOutboundClient::new(&config.connection_pool);
    let handler = Arc::new(ProxyHandler::new(
        Arc::new(RequestLog::new()),
        Arc::new(Filters::new()),
        Arc::new(client),
    ));

    if let Some(metrics) = &config.metrics {
        let addr = SocketAddr::new(config.listen.address, metrics.port);
        let server = MetricsServer::bind(addr).await?;
        tokio::spawn(async move {
            if let Err(e) = server.run().await {
                error!("Metrics server stopped: {}", e);
            }
        });
    }

    let server = ProxyServer::bind(config.listen.socket_addr(), handler).await?;
    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await?;
    info!("Stopped");
    Ok(())
}
