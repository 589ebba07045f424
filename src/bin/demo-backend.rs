//! Stand-in backend fleet for local runs.
//!
//! Every path answers after a random 0-250ms delay.

use axum::{extract::State, routing::any, Router};
use clap::Parser;
use rand::Rng;
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(name = "demo-backend")]
#[command(about = "Serve simulated backends on the given addresses", long_about = None)]
struct Cli {
    /// Addresses to listen on, e.g. 127.0.0.1:3000,127.0.0.1:3001
    #[arg(short, long, value_delimiter = ',', default_value = "127.0.0.1:3000")]
    addr: Vec<String>,
}

async fn simulated_work(State(addr): State<String>) -> String {
    let ms = rand::thread_rng().gen_range(0..250);
    tokio::time::sleep(Duration::from_millis(ms)).await;
    format!("({}) Returned response in {}(ms)\n", addr, ms)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    balancer::observability::logging::init("info");
    let cli = Cli::parse();

    let mut servers = Vec::new();
    for addr in cli.addr {
        let listener = TcpListener::bind(&addr).await?;
        let app = Router::new()
            .route("/", any(simulated_work))
            .route("/{*path}", any(simulated_work))
            .with_state(addr.clone());

        tracing::info!(address = %addr, "Demo backend started");
        servers.push(tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await
        }));
    }

    for server in servers {
        server.await??;
    }
    tracing::info!("Demo backends shut down");
    Ok(())
}
