//! Tick stream server configuration.

use super::non_empty;

#[derive(Debug, Clone)]
pub struct ServerEnvConfig {
    pub bind_address: String,
}

impl Default for ServerEnvConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8000".to_string(),
        }
    }
}

impl ServerEnvConfig {
    pub fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        non_empty(lookup, "WS_BIND_ADDRESS")
            .map(|bind_address| Self { bind_address })
            .unwrap_or_default()
    }
}
