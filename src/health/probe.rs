//! TCP reachability probe.

use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time;

/// Return true if a TCP connection to `address` opens within `timeout`.
/// No application-level handshake is attempted.
pub async fn is_reachable(address: &str, timeout: Duration) -> bool {
    match time::timeout(timeout, TcpStream::connect(address)).await {
        Ok(Ok(_stream)) => true,
        Ok(Err(e)) => {
            tracing::debug!(backend = %address, error = %e, "Health probe failed: connection error");
            false
        }
        Err(_) => {
            tracing::debug!(backend = %address, timeout = ?timeout, "Health probe failed: timeout");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn listening_port_is_reachable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        assert!(is_reachable(&addr, Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn closed_port_is_not_reachable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);
        assert!(!is_reachable(&addr, Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn unresolvable_host_is_not_reachable() {
        assert!(!is_reachable("no-such-host.invalid:80", Duration::from_secs(2)).await);
    }
}
