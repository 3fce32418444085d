//! The `server` config section.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::error;

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30 * 60);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

const DEFAULT_HTTP_PORT: u16 = 8099;

fn default_http_port() -> u16 {
    DEFAULT_HTTP_PORT
}

fn default_refresh() -> String {
    "30m".to_string()
}

fn default_fetch_timeout() -> String {
    "10s".to_string()
}

/// Process-level settings. Durations are humantime strings ("5m", "1h 30m").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub host: String,

    #[serde(default = "default_http_port")]
    pub http_port: u16,

    #[serde(default = "default_refresh")]
    pub refresh: String,

    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout: String,

    #[serde(default)]
    pub debug: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: String::new(),
            http_port: DEFAULT_HTTP_PORT,
            refresh: default_refresh(),
            fetch_timeout: default_fetch_timeout(),
            debug: false,
        }
    }
}

impl ServerConfig {
    /// Address the HTTP API binds to. An empty host means all interfaces.
    pub fn http_addr(&self) -> String {
        let host = if self.host.is_empty() {
            "0.0.0.0"
        } else {
            self.host.as_str()
        };
        format!("{}:{}", host, self.http_port)
    }

    /// Refresh interval, falling back to 30 minutes when unparsable.
    pub fn refresh_interval(&self) -> Duration {
        parse_or(&self.refresh, DEFAULT_REFRESH_INTERVAL, "server.refresh")
    }

    pub fn fetch_timeout(&self) -> Duration {
        parse_or(&self.fetch_timeout, DEFAULT_FETCH_TIMEOUT, "server.fetch_timeout")
    }
}

fn parse_or(value: &str, fallback: Duration, key: &str) -> Duration {
    match humantime::parse_duration(value) {
        Ok(duration) if !duration.is_zero() => duration,
        Ok(_) => {
            error!(key, value, ?fallback, "Zero duration is not allowed, falling back to default");
            fallback
        }
        Err(e) => {
            error!(key, value, ?fallback, error = %e, "Failed to parse duration, falling back to default");
            fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_interval_parses_humantime() {
        let config = ServerConfig {
            refresh: "5m".to_string(),
            ..Default::default()
        };
        assert_eq!(config.refresh_interval(), Duration::from_secs(300));
    }

    #[test]
    fn unparsable_refresh_falls_back() {
        let config = ServerConfig {
            refresh: "every now and then".to_string(),
            ..Default::default()
        };
        assert_eq!(config.refresh_interval(), DEFAULT_REFRESH_INTERVAL);

        let zero = ServerConfig {
            refresh: "0s".to_string(),
            ..Default::default()
        };
        assert_eq!(zero.refresh_interval(), DEFAULT_REFRESH_INTERVAL);
    }

    #[test]
    fn empty_host_binds_all_interfaces() {
        let config = ServerConfig::default();
        assert_eq!(config.http_addr(), "0.0.0.0:8099");
    }
}
