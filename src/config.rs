//! Server configuration.
//!
//! Parsed from the command line with `clap`. Every field has a default so
//! `Config::default()` is a usable configuration for tests.

use crate::storage::ExpiryConfig;
use clap::Parser;
use std::time::Duration;

/// Command-line configuration for the server.
#[derive(Debug, Clone, Parser)]
#[command(name = "resplite", version, about = "A minimal RESP key-value server")]
pub struct Config {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = crate::DEFAULT_HOST)]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = crate::DEFAULT_PORT)]
    pub port: u16,

    /// Milliseconds between background expiry sweeps
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..))]
    pub sweep_interval_ms: u64,

    /// TTL in milliseconds for SET without PX (unset: keys never expire)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub default_ttl_ms: Option<u64>,

    /// Default log filter, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: crate::DEFAULT_HOST.to_string(),
            port: crate::DEFAULT_PORT,
            sweep_interval_ms: 1000,
            default_ttl_ms: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Returns the bind address as a string
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// TTL applied by SET without PX.
    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl_ms.map(Duration::from_millis)
    }

    pub fn expiry_config(&self) -> ExpiryConfig {
        ExpiryConfig {
            interval: Duration::from_millis(self.sweep_interval_ms),
        }
    }
}
