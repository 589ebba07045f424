//! Reverse-proxy load balancer.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                  BALANCER                    │
//!   Client Request     │  ┌────────┐    ┌────────────┐    ┌─────────┐ │
//!   ───────────────────┼─▶│  http  │───▶│    pool    │───▶│ backend │─┼──▶ Backend
//!                      │  │ server │    │  dispatch  │    │transport│ │    Server
//!                      │  └────────┘    └─────┬──────┘    └────┬────┘ │
//!                      │                      │  retry, then    │      │
//!                      │                      │◀─ mark dead ────┘      │
//!                      │                      │   and fail over        │
//!                      │  ┌───────────────────┴──────────────────────┐ │
//!                      │  │ health monitor (15s)  stats reporter (20m)│ │
//!                      │  └──────────────────────────────────────────┘ │
//!                      └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use balancer::config::{read_config, validate_config, ConfigError, ProxyConfig};
use balancer::lifecycle::{signals, startup, Shutdown};
use balancer::observability::{logging, metrics};
use balancer::{Algorithm, HttpServer};

#[derive(Parser)]
#[command(name = "balancer")]
#[command(about = "Reverse-proxy load balancer with retry and failover", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backends in format: localhost:4000,localhost:4001
    #[arg(short, long, value_delimiter = ',')]
    backends: Vec<String>,

    /// Port number for the load balancer.
    #[arg(short, long)]
    port: Option<u16>,

    /// Selection algorithm: alwaysfirst, roundrobin, leastlatency, fewestconn.
    #[arg(short, long)]
    algorithm: Option<Algorithm>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Load the file (if any) and apply command-line overrides on top.
    fn into_config(self) -> Result<ProxyConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => read_config(path)?,
            None => ProxyConfig::default(),
        };

        if !self.backends.is_empty() {
            config.backends = self.backends;
        }
        if let Some(algorithm) = self.algorithm {
            config.algorithm = algorithm;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }
        if let Some(port) = self.port {
            let mut bind: SocketAddr = config
                .listener
                .bind_address
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([0, 0, 0, 0], port)));
            bind.set_port(port);
            config.listener.bind_address = bind.to_string();
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Cli::parse().into_config()?;

    logging::init(&config.observability.log_level);
    tracing::info!("balancer v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        algorithm = %config.algorithm,
        backends = ?config.backends,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let pool = Arc::new(startup::build_pool(&config)?);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    let server_shutdown = shutdown.subscribe();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signals::trigger_on_signal(&signal_shutdown).await;
    });

    HttpServer::new(config, pool).run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
