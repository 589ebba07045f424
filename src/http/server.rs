//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (request ID, tracing)
//! - Start background tasks (health monitor, stats reporter, admin)
//! - Serve until shutdown, then drain within the grace period

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::admin;
use crate::config::ProxyConfig;
use crate::health::active::HealthMonitor;
use crate::load_balancer::Pool;
use crate::observability::{metrics, stats::StatsReporter};
use crate::proxy::ProxyRequest;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<Pool>,
    pub max_body_bytes: usize,
}

/// HTTP server for the load balancer.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    pool: Arc<Pool>,
}

impl HttpServer {
    /// Create a new HTTP server dispatching into `pool`.
    ///
    /// `config` is expected to have passed `validate_config`. Background loops
    /// with a zero interval are skipped rather than started.
    pub fn new(config: ProxyConfig, pool: Arc<Pool>) -> Self {
        let state = AppState {
            pool: pool.clone(),
            max_body_bytes: config.listener.max_body_bytes,
        };

        let router = Self::build_router(state);
        Self {
            router,
            config,
            pool,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            )
    }

    /// The router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            algorithm = %self.pool.algorithm(),
            backends = self.pool.backends().len(),
            "HTTP server starting"
        );

        let mut background = Vec::new();

        let monitor = HealthMonitor::new(self.pool.clone(), self.config.health_check.clone());
        background.push(tokio::spawn(monitor.run(shutdown.resubscribe())));

        let reporter = StatsReporter::new(self.pool.clone(), self.config.stats.clone());
        background.push(tokio::spawn(reporter.run(shutdown.resubscribe())));

        if self.config.admin.enabled {
            let admin_listener = TcpListener::bind(&self.config.admin.bind_address).await?;
            tracing::info!(address = %admin_listener.local_addr()?, "Admin endpoint listening");
            let app = admin::router(self.pool.clone());
            let mut admin_shutdown = shutdown.resubscribe();
            background.push(tokio::spawn(async move {
                let result = axum::serve(admin_listener, app)
                    .with_graceful_shutdown(async move {
                        let _ = admin_shutdown.recv().await;
                    })
                    .await;
                if let Err(e) = result {
                    tracing::error!(error = %e, "Admin server failed");
                }
            }));
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let mut stop_accepting = shutdown.resubscribe();
        let mut drain = shutdown;

        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop_accepting.recv().await;
            })
            .into_future();
        tokio::pin!(serve);

        let grace = Duration::from_secs(self.config.listener.shutdown_grace_secs);
        tokio::select! {
            result = &mut serve => result?,
            _ = drain.recv() => {
                tracing::info!(grace_secs = grace.as_secs(), "Shutdown signal received, draining");
                match tokio::time::timeout(grace, &mut serve).await {
                    Ok(result) => result?,
                    Err(_) => tracing::warn!("Grace period elapsed with requests still in flight"),
                }
            }
        }

        for task in background {
            task.abort();
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Main proxy handler.
/// Buffers the request and hands it to the pool.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    let client_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    tracing::debug!(
        method = %method,
        path = %request.uri().path(),
        "Proxying request"
    );

    let request = match ProxyRequest::from_request(request, client_addr, state.max_body_bytes).await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, "Rejecting request");
            let status = e.status_code();
            metrics::record_request(&method, status.as_u16(), start_time);
            return (status, e.to_string()).into_response();
        }
    };

    let response = match state.pool.dispatch(&request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Request failed");
            e.into_response()
        }
    };

    metrics::record_request(&method, response.status().as_u16(), start_time);
    response
}
