//! # CLI Configuration
//!
//! Environment-based configuration for the `cachemq` binary.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use cachemq_broker::BrokerConfig;
use cachemq_cache::StoreConfig;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Binary configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Redis store configuration
    pub store: StoreConfig,

    /// Broker configuration
    pub broker: BrokerConfig,

    /// Logging level
    pub log_level: String,

    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup; unset or unparsable values
    /// fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let timeout = parsed(&lookup, "OPERATION_TIMEOUT_MS").map(Duration::from_millis);

        let store_defaults = StoreConfig::default();
        let store = StoreConfig {
            url: lookup("REDIS_URL").unwrap_or(store_defaults.url),
            pool_size: parsed(&lookup, "REDIS_POOL_SIZE")
                .filter(|size: &usize| *size > 0)
                .unwrap_or(store_defaults.pool_size),
            operation_timeout: timeout.unwrap_or(store_defaults.operation_timeout),
            namespace: lookup("CACHE_NAMESPACE").filter(|ns| !ns.is_empty()),
            ..store_defaults
        };

        let broker_defaults = BrokerConfig::default();
        let broker = BrokerConfig {
            url: lookup("AMQP_URL").unwrap_or(broker_defaults.url),
            default_queue: lookup("DEFAULT_QUEUE")
                .filter(|q| !q.is_empty())
                .unwrap_or(broker_defaults.default_queue),
            durable: lookup("QUEUE_DURABLE")
                .and_then(|v| flag(&v))
                .unwrap_or(broker_defaults.durable),
            operation_timeout: timeout.unwrap_or(broker_defaults.operation_timeout),
            ..broker_defaults
        };

        Self {
            store,
            broker,
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_format: parsed(&lookup, "LOG_FORMAT").unwrap_or(LogFormat::Json),
        }
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.parse().ok())
}

fn flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Built-in defaults; ignores the environment.
impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
