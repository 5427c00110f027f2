//! Server configuration
//!
//! Every option can be given on the command line or through a `POLLQ_*`
//! environment variable.

use std::net::SocketAddr;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use pollq_core::BrokerConfig;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Pretty,
    /// One JSON object per event
    Json,
}

/// PollQ server options
#[derive(Debug, Clone, Parser)]
#[command(name = "pollq", version, about = "In-memory message broker with long-polling consumers")]
pub struct ServerConfig {
    /// Address the HTTP server listens on
    #[arg(long, env = "POLLQ_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// Long-poll timeout used when a consumer gives none, in milliseconds
    #[arg(long, env = "POLLQ_DEFAULT_TIMEOUT_MS", default_value_t = 10_000)]
    pub default_timeout_ms: u64,

    /// Upper bound for requested long-poll timeouts, in milliseconds.
    /// Requested timeouts are honoured as given when unset.
    #[arg(long, env = "POLLQ_MAX_TIMEOUT_MS")]
    pub max_timeout_ms: Option<u64>,

    /// Log output format
    #[arg(long, env = "POLLQ_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Broker settings derived from the command line
    pub fn broker_config(&self) -> pollq_types::Result<BrokerConfig> {
        BrokerConfig::new(
            Duration::from_millis(self.default_timeout_ms),
            self.max_timeout_ms.map(Duration::from_millis),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::try_parse_from(["pollq"]).unwrap();
        assert_eq!(config.bind, "127.0.0.1:3000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.log_format, LogFormat::Pretty);

        let broker = config.broker_config().unwrap();
        assert_eq!(broker.default_timeout, Duration::from_millis(10_000));
        assert_eq!(broker.max_timeout, None);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::try_parse_from([
            "pollq",
            "--bind",
            "0.0.0.0:8080",
            "--default-timeout-ms",
            "500",
            "--max-timeout-ms",
            "1000",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.log_format, LogFormat::Json);
        let broker = config.broker_config().unwrap();
        assert_eq!(broker.default_timeout, Duration::from_millis(500));
        assert_eq!(broker.max_timeout, Some(Duration::from_millis(1000)));
    }

    #[test]
    fn test_rejects_inconsistent_timeouts() {
        let config = ServerConfig::try_parse_from([
            "pollq",
            "--default-timeout-ms",
            "5000",
            "--max-timeout-ms",
            "10",
        ])
        .unwrap();
        assert!(matches!(
            config.broker_config(),
            Err(pollq_types::Error::Config(_))
        ));
    }
}
