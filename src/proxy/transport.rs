//! Per-backend forwarding transport.
//!
//! # Responsibilities
//! - Rewrite a `ProxyRequest` onto one backend's authority
//! - Send it with a bounded deadline
//! - Hand the response back with hop-by-hop headers removed
//!
//! # Design Decisions
//! - One client per backend; the transport is owned by its `Backend`
//! - Only transport failures are errors; any HTTP status is a response

use axum::body::Body;
use axum::http::uri::{Authority, Scheme};
use axum::http::{Request, Response, Uri, Version};
use futures_util::future::BoxFuture;
use hyper::body::Incoming;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::fmt;
use std::time::Duration;

use crate::proxy::request::{strip_hop_by_hop, ProxyRequest};

/// A forwarding attempt failed before a response was received.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid upstream request: {0}")]
    InvalidRequest(String),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),

    #[error("upstream timed out after {0:?}")]
    Timeout(Duration),
}

/// Something that can carry a request to one fixed backend.
pub trait Transport: Send + Sync + fmt::Debug {
    fn send<'a>(
        &'a self,
        request: &'a ProxyRequest,
    ) -> BoxFuture<'a, Result<Response<Body>, TransportError>>;
}

/// HTTP/1.1 transport bound to a single backend address.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    authority: Authority,
    client: Client<HttpConnector, Body>,
    request_timeout: Duration,
}

impl HttpTransport {
    /// Create a transport for `address` (`host:port`).
    pub fn new(
        address: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let authority: Authority = address
            .parse()
            .map_err(|e| TransportError::InvalidRequest(format!("bad address {}: {}", address, e)))?;

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new()).build(connector);

        Ok(Self {
            authority,
            client,
            request_timeout,
        })
    }

    fn upstream_request(&self, request: &ProxyRequest) -> Result<Request<Body>, TransportError> {
        let uri = Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.authority.clone())
            .path_and_query(request.path_and_query())
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        // The upstream client speaks HTTP/1.x; h2 and h3 callers are downgraded.
        let version = match request.version {
            Version::HTTP_10 => Version::HTTP_10,
            _ => Version::HTTP_11,
        };

        let mut builder = Request::builder()
            .method(request.method.clone())
            .version(version)
            .uri(uri);
        if let Some(headers) = builder.headers_mut() {
            *headers = request.forwarded_headers();
        }

        builder
            .body(Body::from(request.body.clone()))
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))
    }
}

impl Transport for HttpTransport {
    fn send<'a>(
        &'a self,
        request: &'a ProxyRequest,
    ) -> BoxFuture<'a, Result<Response<Body>, TransportError>> {
        Box::pin(async move {
            let upstream = self.upstream_request(request)?;

            let response: Response<Incoming> =
                tokio::time::timeout(self.request_timeout, self.client.request(upstream))
                    .await
                    .map_err(|_| TransportError::Timeout(self.request_timeout))??;

            let (mut parts, body) = response.into_parts();
            strip_hop_by_hop(&mut parts.headers);
            Ok(Response::from_parts(parts, Body::new(body)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Method;

    #[test]
    fn rewrites_onto_backend_authority() {
        let transport = HttpTransport::new(
            "127.0.0.1:3000",
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap();
        let request = ProxyRequest::new(Method::POST, "/orders?id=7".parse().unwrap());

        let upstream = transport.upstream_request(&request).unwrap();
        assert_eq!(upstream.method(), Method::POST);
        assert_eq!(upstream.uri().to_string(), "http://127.0.0.1:3000/orders?id=7");
        assert_eq!(upstream.version(), Version::HTTP_11);
    }

    #[test]
    fn keeps_http10_and_downgrades_h2() {
        let transport = HttpTransport::new(
            "127.0.0.1:3000",
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap();

        let mut request = ProxyRequest::new(Method::GET, "/".parse().unwrap());
        request.version = Version::HTTP_10;
        assert_eq!(transport.upstream_request(&request).unwrap().version(), Version::HTTP_10);

        request.version = Version::HTTP_2;
        assert_eq!(transport.upstream_request(&request).unwrap().version(), Version::HTTP_11);
    }

    #[test]
    fn rejects_unparseable_address() {
        let err = HttpTransport::new("not a host", Duration::from_secs(1), Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, TransportError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn refused_connection_is_transport_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HttpTransport::new(
            &addr.to_string(),
            Duration::from_millis(500),
            Duration::from_secs(1),
        )
        .unwrap();
        let request = ProxyRequest::new(Method::GET, "/".parse().unwrap());

        assert!(transport.send(&request).await.is_err());
    }
}
