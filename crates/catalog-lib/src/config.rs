//! Picker configuration

use anyhow::Result;
use serde::Deserialize;

/// Tunable settings, read once at startup and passed into components
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Scheme for derived orb.local URLs
    #[serde(default = "default_url_scheme")]
    pub url_scheme: String,

    /// How long a cached catalog snapshot stays fresh, in milliseconds
    #[serde(default = "default_cache_ttl_ms")]
    pub cache_ttl_ms: u64,

    /// Sample CPU/memory usage for running containers (slower refresh)
    #[serde(default)]
    pub enable_stats: bool,

    /// Window passed to `docker logs --since`
    #[serde(default = "default_logs_since")]
    pub logs_since: String,

    /// Last-resort shell for the exec action
    #[serde(default = "default_fallback_shell")]
    pub fallback_shell: String,
}

fn default_url_scheme() -> String {
    "https".to_string()
}

fn default_cache_ttl_ms() -> u64 {
    2000
}

fn default_logs_since() -> String {
    "10m".to_string()
}

fn default_fallback_shell() -> String {
    "/bin/sh".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            url_scheme: default_url_scheme(),
            cache_ttl_ms: default_cache_ttl_ms(),
            enable_stats: false,
            logs_since: default_logs_since(),
            fallback_shell: default_fallback_shell(),
        }
    }
}

impl Settings {
    /// Load configuration from `ORBPICK_*` environment variables
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("ORBPICK").try_parsing(true))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_default())
    }
}
