//! Broker configuration

use std::time::Duration;

use pollq_types::{Error, Result};

/// Long-poll timeout used when a consumer does not ask for one
pub const DEFAULT_CONSUME_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Tunables for the matching engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrokerConfig {
    /// Timeout applied when the consumer gives none (or an unusable one)
    pub default_timeout: Duration,

    /// Optional upper bound for requested timeouts. Unbounded when `None`.
    pub max_timeout: Option<Duration>,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            default_timeout: DEFAULT_CONSUME_TIMEOUT,
            max_timeout: None,
        }
    }
}

impl BrokerConfig {
    /// Build a validated configuration
    pub fn new(default_timeout: Duration, max_timeout: Option<Duration>) -> Result<Self> {
        if default_timeout.is_zero() {
            return Err(Error::Config(
                "default consume timeout must be positive".to_string(),
            ));
        }
        if let Some(max_timeout) = max_timeout {
            if max_timeout < default_timeout {
                return Err(Error::Config(format!(
                    "max consume timeout ({}ms) is below the default ({}ms)",
                    max_timeout.as_millis(),
                    default_timeout.as_millis()
                )));
            }
        }
        Ok(Self {
            default_timeout,
            max_timeout,
        })
    }

    /// Resolve the timeout a consume request will actually wait for
    pub fn effective_timeout(&self, requested: Option<Duration>) -> Duration {
        let timeout = requested
            .filter(|timeout| !timeout.is_zero())
            .unwrap_or(self.default_timeout);

        match self.max_timeout {
            Some(max_timeout) => timeout.min(max_timeout),
            None => timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BrokerConfig::default();
        assert_eq!(config.default_timeout, Duration::from_millis(10_000));
        assert_eq!(config.max_timeout, None);
        assert_eq!(config.effective_timeout(None), Duration::from_millis(10_000));
    }

    #[test]
    fn test_long_timeouts_are_not_capped_by_default() {
        let config = BrokerConfig::default();
        assert_eq!(
            config.effective_timeout(Some(Duration::from_secs(600))),
            Duration::from_secs(600)
        );
        assert_eq!(
            config.effective_timeout(Some(Duration::from_secs(86_400))),
            Duration::from_secs(86_400)
        );
    }

    #[test]
    fn test_effective_timeout_with_cap() {
        let config =
            BrokerConfig::new(Duration::from_secs(1), Some(Duration::from_secs(5))).unwrap();
        assert_eq!(
            config.effective_timeout(Some(Duration::from_millis(50))),
            Duration::from_millis(50)
        );
        assert_eq!(
            config.effective_timeout(Some(Duration::ZERO)),
            Duration::from_secs(1)
        );
        assert_eq!(
            config.effective_timeout(Some(Duration::from_secs(60))),
            Duration::from_secs(5)
        );
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            BrokerConfig::new(Duration::ZERO, None),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            BrokerConfig::new(Duration::from_secs(10), Some(Duration::from_secs(1))),
            Err(Error::Config(_))
        ));
        assert!(BrokerConfig::new(Duration::from_secs(10), None).is_ok());
    }
}
