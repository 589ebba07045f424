//! Backend abstraction.
//!
//! # Responsibilities
//! - Represent a single backend server
//! - Track liveness (flipped by health checks and failover)
//! - Track active connections, total requests and cumulative latency
//! - Own the forwarding transport bound to the backend's address

use axum::body::Body;
use axum::http::Response;
use futures_util::future::BoxFuture;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

use crate::observability::metrics;
use crate::proxy::{HttpTransport, ProxyRequest, Transport, TransportError};

/// Latency reported for a backend that has not served anything yet.
pub const DEFAULT_LATENCY_MS: u64 = 75;

/// Point-in-time view of a backend, for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendStats {
    pub address: String,
    pub alive: bool,
    pub active_connections: usize,
    pub total_requests: u64,
    pub average_latency_ms: u64,
}

/// The capability set the pool needs from a backend.
pub trait Server: Send + Sync + fmt::Debug {
    fn address(&self) -> &str;

    fn is_alive(&self) -> bool;

    fn set_alive(&self, alive: bool);

    fn active_connections(&self) -> usize;

    fn total_requests(&self) -> u64;

    /// Average latency in milliseconds.
    fn average_latency(&self) -> u64;

    /// Forward one attempt of `request` to this backend.
    fn forward<'a>(
        &'a self,
        request: &'a ProxyRequest,
    ) -> BoxFuture<'a, Result<Response<Body>, TransportError>>;

    fn stats(&self) -> BackendStats {
        BackendStats {
            address: self.address().to_string(),
            alive: self.is_alive(),
            active_connections: self.active_connections(),
            total_requests: self.total_requests(),
            average_latency_ms: self.average_latency(),
        }
    }
}

/// A single downstream server.
#[derive(Debug)]
pub struct Backend {
    address: String,
    alive: AtomicBool,
    active_connections: AtomicUsize,
    total_requests: AtomicU64,
    /// Requests that got a response; the divisor for average latency.
    served_requests: AtomicU64,
    cumulative_latency_ms: AtomicU64,
    transport: Box<dyn Transport>,
}

impl Backend {
    /// Create a backend with an HTTP transport to `address`.
    pub fn new(
        address: impl Into<String>,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let address = address.into();
        let transport = HttpTransport::new(&address, connect_timeout, request_timeout)?;
        Ok(Self::with_transport(address, Box::new(transport)))
    }

    /// Create a backend around an arbitrary transport.
    pub fn with_transport(address: impl Into<String>, transport: Box<dyn Transport>) -> Self {
        Self {
            address: address.into(),
            alive: AtomicBool::new(true),
            active_connections: AtomicUsize::new(0),
            total_requests: AtomicU64::new(0),
            served_requests: AtomicU64::new(0),
            cumulative_latency_ms: AtomicU64::new(0),
            transport,
        }
    }

    /// Count a request as started. The returned guard ends it on drop.
    fn begin_request(&self) -> ConnectionGuard<'_> {
        self.active_connections.fetch_add(1, Ordering::SeqCst);
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        metrics::record_backend_request(&self.address);
        ConnectionGuard { backend: self }
    }

    fn record_latency(&self, elapsed: Duration) {
        let ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.cumulative_latency_ms.fetch_add(ms, Ordering::Relaxed);
        self.served_requests.fetch_add(1, Ordering::Relaxed);
    }
}

impl Server for Backend {
    fn address(&self) -> &str {
        &self.address
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    fn set_alive(&self, alive: bool) {
        self.alive.store(alive, Ordering::Release);
    }

    fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::SeqCst)
    }

    fn total_requests(&self) -> u64 {
        self.total_requests.load(Ordering::Relaxed)
    }

    fn average_latency(&self) -> u64 {
        let served = self.served_requests.load(Ordering::Relaxed);
        if served == 0 {
            return DEFAULT_LATENCY_MS;
        }
        self.cumulative_latency_ms.load(Ordering::Relaxed) / served
    }

    fn forward<'a>(
        &'a self,
        request: &'a ProxyRequest,
    ) -> BoxFuture<'a, Result<Response<Body>, TransportError>> {
        Box::pin(async move {
            // Held across the await so cancellation also releases the slot.
            let _guard = self.begin_request();
            let started = Instant::now();

            let response = self.transport.send(request).await?;
            self.record_latency(started.elapsed());
            Ok(response)
        })
    }
}

/// A RAII guard that manages the active connection count.
#[derive(Debug)]
struct ConnectionGuard<'a> {
    backend: &'a Backend,
}

impl Drop for ConnectionGuard<'_> {
    fn drop(&mut self) {
        self.backend.active_connections.fetch_sub(1, Ordering::SeqCst);
    }
}
