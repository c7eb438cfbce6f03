//! # Gateway Runtime Library
//!
//! Start-up plumbing for the `gateway-runtime` binary, exposed for testing:
//! configuration resolution, environment overrides and logging setup.
//!
//! ## Configuration sources (later wins)
//!
//! 1. Built-in defaults
//! 2. `$CSG_CONFIG`, else `config/config.$APP_ENV.toml`, else
//!    `config/config.toml` (first that exists)
//! 3. `CSG_*` environment overrides

#![allow(missing_docs)]

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use summary_gateway::domain::{ConfigError, LogFormat};
use summary_gateway::GatewayConfig;
use tracing_subscriber::EnvFilter;

/// Directory searched for config files when `CSG_CONFIG` is unset.
pub const CONFIG_DIR: &str = "config";

/// Configuration plus the file it came from, if any.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: GatewayConfig,
    pub source: Option<PathBuf>,
}

/// Pick the config file: `CSG_CONFIG` verbatim, else the first existing
/// candidate under `dir`.
pub fn config_path<F>(dir: &Path, lookup: F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = lookup("CSG_CONFIG") {
        return Some(PathBuf::from(path));
    }

    lookup("APP_ENV")
        .map(|env| dir.join(format!("config.{}.toml", env)))
        .into_iter()
        .chain(std::iter::once(dir.join("config.toml")))
        .find(|candidate| candidate.exists())
}

/// Resolve, override and validate configuration.
pub fn load_config<F>(dir: &Path, lookup: F) -> Result<LoadedConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let source = config_path(dir, &lookup);
    let mut config = match &source {
        Some(path) => GatewayConfig::load(path)?,
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, &lookup)?;
    config.validate()?;

    Ok(LoadedConfig { config, source })
}

/// Apply `CSG_*` overrides. A present but unparsable value is an error.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = lookup("CSG_PORT") {
        config.http.port = parse_var("CSG_PORT", &port)?;
    }
    if let Some(host) = lookup("CSG_HOST") {
        config.http.host = parse_var::<IpAddr>("CSG_HOST", &host)?;
    }
    if let Some(sla) = lookup("CSG_SLA_MS") {
        config.sla.max_response_time = Duration::from_millis(parse_var("CSG_SLA_MS", &sla)?);
    }
    if let Some(level) = lookup("CSG_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(format) = lookup("CSG_LOG_FORMAT") {
        config.logging.format = match format.to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" => LogFormat::Pretty,
            _ => return Err(invalid_var("CSG_LOG_FORMAT", &format)),
        };
    }

    let backends = &mut config.backends;
    for (var, backend) in [
        ("CSG_IDENTITY_URL", &mut backends.identity),
        ("CSG_ACCESS_URL", &mut backends.access),
        ("CSG_CONTEXT_URL", &mut backends.context),
    ] {
        if let Some(url) = lookup(var) {
            backend.url = Some(url).filter(|u| !u.trim().is_empty());
        }
    }

    Ok(())
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| invalid_var(name, value))
}

fn invalid_var(name: &str, value: &str) -> ConfigError {
    ConfigError::Invalid(format!("{}={:?} is not valid", name, value))
}

/// Install the global subscriber. `RUST_LOG` overrides the configured level.
pub fn init_tracing(logging: &summary_gateway::domain::config::LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .map_err(|e| anyhow::anyhow!("invalid log level {:?}: {}", logging.level, e))?;

    let installed = match logging.format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .try_init(),
    };

    installed.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {}", e))
}
