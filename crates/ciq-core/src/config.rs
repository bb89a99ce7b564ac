//! Application configuration loaded from TOML.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

fn default_blueprint_path() -> String {
    "blueprint.yaml".to_string()
}

fn default_session_ttl_secs() -> u64 {
    3600 // 1 hour
}

fn default_sweep_interval_secs() -> u64 {
    300 // 5 minutes
}

fn default_max_sessions() -> usize {
    100
}

/// Session registry tuning knobs.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SessionConfig {
    /// Seconds of inactivity after which a session expires.
    #[serde(default = "default_session_ttl_secs")]
    pub ttl_secs: u64,
    /// How often the opportunistic expiry sweep should run.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
    /// Soft cap on concurrently tracked sessions.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_session_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
            max_sessions: default_max_sessions(),
        }
    }
}

/// Root configuration for the copilot.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CiqConfig {
    /// Path to the annotated YAML blueprint template.
    #[serde(default = "default_blueprint_path")]
    pub blueprint_path: String,
    #[serde(default)]
    pub session: SessionConfig,
}

impl Default for CiqConfig {
    fn default() -> Self {
        Self {
            blueprint_path: default_blueprint_path(),
            session: SessionConfig::default(),
        }
    }
}

impl CiqConfig {
    /// Loads configuration from a TOML file, falling back to defaults for
    /// any missing field.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }
}
