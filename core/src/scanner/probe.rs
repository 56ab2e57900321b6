//! Loopback reachability probe.

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;

/// Decides whether a loopback TCP port accepts connections.
#[derive(Debug, Clone, Copy)]
pub struct Prober {
    timeout: Duration,
}

impl Prober {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Try IPv4 loopback, then IPv6 loopback, each bounded by the probe timeout.
    ///
    /// Refusal, timeout and unreachable addresses all read as closed.
    pub async fn probe(&self, port: u16) -> bool {
        let v4 = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        if self.connect(v4).await {
            return true;
        }
        let v6 = SocketAddr::from((Ipv6Addr::LOCALHOST, port));
        self.connect(v6).await
    }

    async fn connect(&self, addr: SocketAddr) -> bool {
        // The stream is dropped right away, closing the connection
        matches!(timeout(self.timeout, TcpStream::connect(addr)).await, Ok(Ok(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn prober() -> Prober {
        Prober::new(Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_open_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        assert!(prober().probe(port).await);
    }

    #[tokio::test]
    async fn test_closed_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        assert!(!prober().probe(port).await);
    }

    #[tokio::test]
    async fn test_ipv6_only_listener() {
        // Hosts without IPv6 loopback cannot run this check
        let Ok(listener) = TcpListener::bind("[::1]:0").await else {
            return;
        };
        let port = listener.local_addr().unwrap().port();
        assert!(prober().probe(port).await);
    }
}
