//! Gateway configuration with validation.
//!
//! Built once at process start and handed to the service by value; the
//! aggregator never reads ambient state.

use serde::{Deserialize, Serialize};
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP server configuration
    pub http: HttpConfig,
    /// End-to-end latency budget
    pub sla: SlaConfig,
    /// Backend endpoints and per-call budgets
    pub backends: BackendsConfig,
    /// Log level and output format
    pub logging: LoggingConfig,
}

impl GatewayConfig {
    /// Parse configuration from a TOML string. Missing keys take defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.port == 0 {
            return Err(ConfigError::Invalid("http.port cannot be 0".into()));
        }

        let sla = self.sla.max_response_time;
        if sla.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "sla.max_response_time cannot be 0".into(),
            ));
        }

        if self.sla.request_timeout < sla {
            return Err(ConfigError::InvalidTimeout(format!(
                "sla.request_timeout ({}ms) is shorter than sla.max_response_time ({}ms)",
                self.sla.request_timeout.as_millis(),
                sla.as_millis()
            )));
        }

        for (name, backend) in self.backends.iter() {
            if backend.timeout.is_zero() {
                return Err(ConfigError::InvalidTimeout(format!(
                    "backends.{}.timeout cannot be 0",
                    name
                )));
            }
            // Leave headroom for assembly and transport
            if backend.timeout >= sla {
                return Err(ConfigError::InvalidTimeout(format!(
                    "backends.{}.timeout ({}ms) must be below sla.max_response_time ({}ms)",
                    name,
                    backend.timeout.as_millis(),
                    sla.as_millis()
                )));
            }
        }

        if self.backends.context_limit == 0 {
            return Err(ConfigError::Invalid(
                "backends.context_limit cannot be 0".into(),
            ));
        }

        Ok(())
    }

    /// Get HTTP server bind address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 8080)
    pub port: u16,
    /// Keep-alive timeout
    #[serde(with = "humantime_serde")]
    pub keep_alive: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 8080,
            keep_alive: Duration::from_secs(120),
        }
    }
}

/// Latency budget configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlaConfig {
    /// Shared deadline armed for every aggregation run
    #[serde(with = "humantime_serde")]
    pub max_response_time: Duration,
    /// Outer guard on the whole HTTP request
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for SlaConfig {
    fn default() -> Self {
        Self {
            max_response_time: Duration::from_millis(200),
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// One backend endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL; `None` serves fixed local data instead
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Per-call budget, tighter than the shared SLA
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl BackendConfig {
    fn with_timeout(timeout: Duration) -> Self {
        Self { url: None, timeout }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::with_timeout(Duration::from_millis(150))
    }
}

/// Backend configuration for the three dependencies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendsConfig {
    pub identity: BackendConfig,
    pub access: BackendConfig,
    pub context: BackendConfig,
    /// Max context items requested per chat
    pub context_limit: u32,
}

impl BackendsConfig {
    fn iter(&self) -> impl Iterator<Item = (&'static str, &BackendConfig)> {
        [
            ("identity", &self.identity),
            ("access", &self.access),
            ("context", &self.context),
        ]
        .into_iter()
    }
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            identity: BackendConfig::with_timeout(Duration::from_millis(150)),
            access: BackendConfig::with_timeout(Duration::from_millis(150)),
            context: BackendConfig::with_timeout(Duration::from_millis(100)),
            context_limit: 10,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read {path}: {error}")]
    Io { path: String, error: String },
    /// Config file is not valid TOML for this schema
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    /// Invalid timeout value
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
    /// General configuration error
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Humantime serde module for Duration serialization
pub mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_nanos() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        // "ms" must be checked before "s" and "m"
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| "invalid milliseconds")
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid seconds")
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim()
                .parse::<u64>()
                .map(|m| Duration::from_secs(m * 60))
                .map_err(|_| "invalid minutes")
        } else {
            // Try parsing as plain seconds
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid duration format")
        }
    }
}
