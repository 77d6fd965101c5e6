use std::time::Duration;

use clap::Parser;

/// Probes a TCP endpoint at a fixed rate and serves latency distributions
/// corrected for coordinated omission.
///
/// Every flag can also be supplied through its environment variable.
#[derive(Debug, Clone, Parser)]
#[command(name = "tcp-latency-monitor")]
pub struct Config {
    /// Target hostname or IP to probe
    #[arg(long, env = "TARGET_HOST")]
    pub target_host: String,

    /// Target port to connect to
    #[arg(long, env = "TARGET_PORT", default_value_t = 22)]
    pub target_port: u16,

    /// Probes per second
    #[arg(long, env = "RATE_PER_SECOND", default_value_t = 10.0)]
    pub rate_per_second: f64,

    /// HTTP port for the dashboard and metrics endpoints
    #[arg(long, env = "SERVER_PORT", default_value_t = 8080)]
    pub server_port: u16,

    /// Per-probe connect timeout in milliseconds
    #[arg(long, env = "PROBE_TIMEOUT_MS", default_value_t = 5000)]
    pub probe_timeout_ms: u64,

    /// Factor by which the pacer may exceed the nominal rate while
    /// recovering from a stall
    #[arg(long, env = "CATCH_UP_RATE_MULTIPLE", default_value_t = 3.0)]
    pub catch_up_rate_multiple: f64,
}

impl Config {
    /// Reject values the measurement engine cannot run with.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.rate_per_second > 0.0) {
            return Err("rate-per-second must be positive".into());
        }
        if self.probe_timeout_ms == 0 {
            return Err("probe-timeout-ms must be at least 1".into());
        }
        if self.catch_up_rate_multiple < 1.0 {
            return Err("catch-up-rate-multiple must be at least 1.0".into());
        }
        Ok(())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(args).expect("args should parse")
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = parse(&["tcp-latency-monitor", "--target-host", "10.0.2.120"]);
        assert_eq!(config.target_host, "10.0.2.120");
        assert_eq!(config.target_port, 22);
        assert_eq!(config.rate_per_second, 10.0);
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.probe_timeout_ms, 5000);
        assert_eq!(config.catch_up_rate_multiple, 3.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn target_host_is_required() {
        assert!(Config::try_parse_from(["tcp-latency-monitor"]).is_err());
    }

    #[test]
    fn validate_rejects_degenerate_values() {
        let mut config = parse(&["tcp-latency-monitor", "--target-host", "h"]);

        config.rate_per_second = 0.0;
        assert!(config.validate().is_err());
        config.rate_per_second = -1.0;
        assert!(config.validate().is_err());
        config.rate_per_second = 10.0;

        config.probe_timeout_ms = 0;
        assert!(config.validate().is_err());
        config.probe_timeout_ms = 5000;

        config.catch_up_rate_multiple = 0.5;
        assert!(config.validate().is_err());
    }
}
