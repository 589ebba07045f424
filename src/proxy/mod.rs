//! Upstream forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound axum request
//!     → request.rs (buffer body, capture client addr)
//!     → pool dispatch picks a backend
//!     → transport.rs (rewrite URI, strip hop-by-hop, send)
//!     → Response streamed back to the client
//! ```

pub mod request;
pub mod transport;

pub use request::{ProxyRequest, RequestError};
pub use transport::{HttpTransport, Transport, TransportError};
