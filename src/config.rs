//! Configuration system.
//!
//! Provides hierarchical configuration loading from:
//! - config.toml (default configuration)
//! - config.local.toml (git-ignored local overrides)
//! - Environment variables (WCRULES_* prefix)
//!
//! ## Example
//!
//! ```toml
//! # config.toml
//! refinement_iteration_cap = 64
//! id_seed = 42
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! WCRULES_REFINEMENT_ITERATION_CAP=128
//! WCRULES_LOGGING__LEVEL=debug
//! ```

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Top-level matcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatcherConfig {
    /// Upper bound on color-refinement iterations during canonical labeling.
    #[serde(default = "default_refinement_iteration_cap")]
    pub refinement_iteration_cap: usize,

    /// Seed for the deterministic id generator.
    #[serde(default = "default_id_seed")]
    pub id_seed: u64,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_refinement_iteration_cap() -> usize {
    64
}
fn default_id_seed() -> u64 {
    0
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

impl MatcherConfig {
    /// Loads configuration from default locations.
    ///
    /// Merges in order:
    /// 1. config.toml (base configuration)
    /// 2. config.local.toml (local overrides, git-ignored)
    /// 3. Environment variables (WCRULES_* prefix)
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("config.toml"))
            .merge(Toml::file("config.local.toml"))
            .merge(Env::prefixed("WCRULES_").split("__"))
            .extract()
    }

    /// Loads configuration from a specific file path.
    pub fn from_file(path: &str) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("WCRULES_").split("__"))
            .extract()
    }
}

impl Default for MatcherConfig {
    fn default() -> Self {
        MatcherConfig {
            refinement_iteration_cap: default_refinement_iteration_cap(),
            id_seed: default_id_seed(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
