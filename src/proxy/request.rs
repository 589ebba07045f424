//! Replayable inbound request.
//!
//! # Responsibilities
//! - Buffer the inbound body once so retries and failover can resend it
//! - Strip hop-by-hop headers before the request leaves the proxy
//! - Record the client address for `X-Forwarded-For`
//!
//! # Design Decisions
//! - Body is held as `Bytes`; cloning per attempt is a refcount bump
//! - Original path and query are preserved verbatim

use axum::body::{Body, Bytes};
use axum::http::{
    header, HeaderMap, HeaderName, HeaderValue, Method, Request, StatusCode, Uri, Version,
};
use axum::BoxError;
use http_body_util::LengthLimitError;
use std::net::SocketAddr;

/// Headers that only apply to a single transport hop.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Error raised while buffering an inbound request.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge { limit: usize },

    #[error("failed to read request body: {0}")]
    Body(#[source] BoxError),
}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            RequestError::Body(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn from_body_error(err: axum::Error, limit: usize) -> Self {
        let inner = err.into_inner();
        let root: &(dyn std::error::Error + 'static) = &*inner;
        let over_limit = std::iter::successors(Some(root), |e| e.source())
            .any(|e| e.is::<LengthLimitError>());

        if over_limit {
            RequestError::BodyTooLarge { limit }
        } else {
            RequestError::Body(inner)
        }
    }
}

/// An inbound request captured in a form that can be forwarded many times.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub client_addr: Option<SocketAddr>,
}

impl ProxyRequest {
    /// Buffer an inbound request, rejecting bodies over `limit` bytes.
    pub async fn from_request(
        request: Request<Body>,
        client_addr: Option<SocketAddr>,
        limit: usize,
    ) -> Result<Self, RequestError> {
        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, limit)
            .await
            .map_err(|err| RequestError::from_body_error(err, limit))?;

        Ok(Self {
            method: parts.method,
            uri: parts.uri,
            version: parts.version,
            headers: parts.headers,
            body,
            client_addr,
        })
    }

    /// Build a request with an empty body. Mostly useful in tests.
    pub fn new(method: Method, uri: Uri) -> Self {
        Self {
            method,
            uri,
            version: Version::HTTP_11,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            client_addr: None,
        }
    }

    /// Path and query of the original request, `/` when absent.
    pub fn path_and_query(&self) -> &str {
        self.uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/")
    }

    /// Headers to send upstream: hop-by-hop removed, `X-Forwarded-For` appended.
    pub fn forwarded_headers(&self) -> HeaderMap {
        let mut headers = self.headers.clone();
        strip_hop_by_hop(&mut headers);

        if let Some(addr) = self.client_addr {
            let client_ip = addr.ip().to_string();
            let value = match headers
                .get(X_FORWARDED_FOR)
                .and_then(|v| v.to_str().ok())
            {
                Some(prior) => format!("{}, {}", prior, client_ip),
                None => client_ip,
            };
            if let Ok(value) = HeaderValue::from_str(&value) {
                headers.insert(X_FORWARDED_FOR, value);
            }
        }

        headers
    }
}

/// `X-Forwarded-For` header name.
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP.iter()) {
        headers.remove(name);
    }
}
