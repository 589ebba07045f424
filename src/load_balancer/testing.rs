//! Scripted fakes shared by the load balancer unit tests.

use axum::body::Body;
use axum::http::Response;
use futures_util::future::BoxFuture;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::load_balancer::backend::{Backend, Server};
use crate::proxy::{ProxyRequest, Transport, TransportError};

/// What a scripted transport does on every call.
#[derive(Debug, Clone, Copy)]
pub enum Outcome {
    Ok,
    OkAfter(Duration),
    Fail,
    /// Sleep, then fail on odd calls and succeed on even ones.
    Alternate(Duration),
}

#[derive(Debug)]
pub struct ScriptedTransport {
    outcome: Outcome,
    calls: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    pub fn boxed(outcome: Outcome) -> Box<dyn Transport> {
        Self::counted(outcome).0
    }

    /// Transport plus a handle on its call counter.
    pub fn counted(outcome: Outcome) -> (Box<dyn Transport>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let transport = Self {
            outcome,
            calls: calls.clone(),
        };
        (Box::new(transport), calls)
    }
}

fn scripted_failure() -> TransportError {
    TransportError::InvalidRequest("scripted failure".to_string())
}

impl Transport for ScriptedTransport {
    fn send<'a>(
        &'a self,
        _request: &'a ProxyRequest,
    ) -> BoxFuture<'a, Result<Response<Body>, TransportError>> {
        Box::pin(async move {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            match self.outcome {
                Outcome::Ok => Ok(Response::new(Body::from("ok"))),
                Outcome::OkAfter(delay) => {
                    tokio::time::sleep(delay).await;
                    Ok(Response::new(Body::from("ok")))
                }
                Outcome::Fail => Err(scripted_failure()),
                Outcome::Alternate(delay) => {
                    tokio::time::sleep(delay).await;
                    if call % 2 == 1 {
                        Err(scripted_failure())
                    } else {
                        Ok(Response::new(Body::from("ok")))
                    }
                }
            }
        })
    }
}

/// A backend with a scripted transport, ready for a pool.
pub fn scripted_backend(address: &str, outcome: Outcome) -> (Arc<dyn Server>, Arc<AtomicUsize>) {
    let (transport, calls) = ScriptedTransport::counted(outcome);
    (Arc::new(Backend::with_transport(address, transport)), calls)
}

/// A server with fixed metrics, for exercising selection in isolation.
#[derive(Debug)]
pub struct StubServer {
    pub address: String,
    pub alive: AtomicBool,
    pub active_connections: usize,
    pub latency_ms: u64,
}

impl StubServer {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
            alive: AtomicBool::new(true),
            active_connections: 0,
            latency_ms: 75,
        }
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_connections(mut self, active_connections: usize) -> Self {
        self.active_connections = active_connections;
        self
    }

    pub fn dead(self) -> Self {
        self.alive.store(false, Ordering::SeqCst);
        self
    }

    pub fn shared(self) -> Arc<dyn Server> {
        Arc::new(self)
    }
}

impl Server for StubServer {
    fn address(&self) -> &str {
        &self.address
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn set_alive(&self, alive: bool) {
        self.alive.store(alive, Ordering::SeqCst);
    }

    fn active_connections(&self) -> usize {
        self.active_connections
    }

    fn total_requests(&self) -> u64 {
        0
    }

    fn average_latency(&self) -> u64 {
        self.latency_ms
    }

    fn forward<'a>(
        &'a self,
        _request: &'a ProxyRequest,
    ) -> BoxFuture<'a, Result<Response<Body>, TransportError>> {
        Box::pin(async move { Ok(Response::new(Body::from(self.address.clone()))) })
    }
}

/// Build `n` live stub servers named `10.0.0.<i>:80`.
pub fn stubs(n: usize) -> Vec<Arc<dyn Server>> {
    (0..n)
        .map(|i| StubServer::new(&format!("10.0.0.{}:80", i)).shared())
        .collect()
}
