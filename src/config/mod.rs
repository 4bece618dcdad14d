//! Configuration module for Sentitick.
//!
//! Structured configuration loading from environment variables, organized by
//! concern: streaming pipeline, data providers, the tick stream server and
//! metrics reporting.

mod observability_config;
mod provider_config;
mod server_config;
mod stream_config;

pub use observability_config::ObservabilityEnvConfig;
pub use provider_config::ProviderEnvConfig;
pub use server_config::ServerEnvConfig;
pub use stream_config::{StreamEnvConfig, parse_symbols};

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Where news and prices come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// HTTP providers
    Live,
    /// Synthetic headlines and random-walk prices
    Mock,
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "live" => Ok(Mode::Live),
            "mock" => Ok(Mode::Mock),
            _ => anyhow::bail!("Invalid MODE: {}. Must be 'live' or 'mock'", s),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub stream: StreamEnvConfig,
    pub providers: ProviderEnvConfig,
    pub server: ServerEnvConfig,
    pub observability: ObservabilityEnvConfig,
}

impl Config {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode_str = lookup("MODE").unwrap_or_else(|| "live".to_string());
        let mode = Mode::from_str(&mode_str)?;

        let stream = StreamEnvConfig::from_lookup(&lookup).context("Failed to load stream config")?;
        let providers =
            ProviderEnvConfig::from_lookup(&lookup).context("Failed to load provider config")?;
        let server = ServerEnvConfig::from_lookup(&lookup);
        let observability = ObservabilityEnvConfig::from_lookup(&lookup)
            .context("Failed to load observability config")?;

        Ok(Self {
            mode,
            stream,
            providers,
            server,
            observability,
        })
    }
}

/// Parses `key` when present, otherwise returns `default`. A present but
/// malformed value is an error.
pub(crate) fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Invalid {}: '{}'", key, raw)),
        _ => Ok(default),
    }
}

/// Non-empty, trimmed value of `key`
pub(crate) fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
