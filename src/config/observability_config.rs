//! Metrics reporting configuration.

use super::parse_or;
use anyhow::{Result, bail};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ObservabilityEnvConfig {
    pub enabled: bool,
    /// Time between two metric snapshots
    pub interval: Duration,
}

impl ObservabilityEnvConfig {
    pub fn from_lookup<F>(lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let enabled = parse_or(lookup, "OBSERVABILITY_ENABLED", true)?;
        let interval_secs = parse_or(lookup, "OBSERVABILITY_INTERVAL", 60u64)?;
        if interval_secs == 0 {
            bail!("OBSERVABILITY_INTERVAL must be greater than zero");
        }

        Ok(Self {
            enabled,
            interval: Duration::from_secs(interval_secs),
        })
    }
}
