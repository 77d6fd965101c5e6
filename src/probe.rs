use std::time::Duration;

use tokio::net::TcpStream;

// ─── TCP probe ───────────────────────────────────────────────────

/// One unit of measured work: a full TCP connect (DNS + handshake) to the
/// target, bounded by the configured timeout. The socket is dropped as soon
/// as the handshake completes — connect time *is* the measurement.
#[derive(Debug, Clone)]
pub struct TcpProber {
    host: String,
    port: u16,
    timeout: Duration,
}

/// Result of a single probe attempt.
#[derive(Debug, Clone)]
pub struct ProbeOutcome {
    pub success: bool,
    pub error: Option<String>,
}

impl ProbeOutcome {
    fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            error: Some(error),
        }
    }
}

impl TcpProber {
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Attempt one connect. Refusals, timeouts, and resolution failures are
    /// reported as failed outcomes, never as errors — a down target is a
    /// data point, not an exception.
    pub async fn attempt(&self) -> ProbeOutcome {
        let connect = TcpStream::connect((self.host.as_str(), self.port));
        match tokio::time::timeout(self.timeout, connect).await {
            Ok(Ok(_stream)) => ProbeOutcome::ok(),
            Ok(Err(e)) => ProbeOutcome::failed(e.to_string()),
            Err(_) => ProbeOutcome::failed(format!(
                "connect timed out after {} ms",
                self.timeout.as_millis()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn connect_to_listening_socket_succeeds() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let prober = TcpProber::new("127.0.0.1", port, Duration::from_secs(1));
        let outcome = prober.attempt().await;

        assert!(outcome.success);
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn connect_to_closed_port_fails_with_detail() {
        // Bind then drop to get a port with nothing listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let prober = TcpProber::new("127.0.0.1", port, Duration::from_secs(1));
        let outcome = prober.attempt().await;

        assert!(!outcome.success);
        assert!(outcome.error.is_some());
    }

    #[test]
    fn target_formats_host_and_port() {
        let prober = TcpProber::new("example.com", 443, Duration::from_secs(5));
        assert_eq!(prober.target(), "example.com:443");
    }
}
