//! Configuration loading.
//!
//! Settings come from an optional `litsearch.toml` next to the working
//! directory, overridden by `LITSEARCH_*` environment variables. Provider
//! API keys may also be supplied through their conventional variables
//! (`SEMANTIC_SCHOLAR_API_KEY`, `SCOPUS_API_KEY`, `WOS_API_KEY`), which the
//! providers read themselves when the config carries no key.

use std::path::PathBuf;

use serde::Deserialize;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Contact email passed to providers with polite pools (Crossref,
    /// OpenAlex)
    #[serde(default)]
    pub contact_email: Option<String>,

    /// Provider API keys
    #[serde(default)]
    pub api_keys: ApiKeys,

    /// Request cache settings
    #[serde(default)]
    pub cache: CacheConfig,
}

/// API keys for providers that require or reward them
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiKeys {
    #[serde(default)]
    pub semantic_scholar: Option<String>,
    #[serde(default)]
    pub scopus: Option<String>,
    #[serde(default)]
    pub wos: Option<String>,
}

/// Request cache settings
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Whether responses are persisted to disk
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Cache directory; defaults to the platform cache dir
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: None,
        }
    }
}

impl CacheConfig {
    /// The directory cache files live in
    pub fn directory(&self) -> PathBuf {
        self.directory.clone().unwrap_or_else(default_cache_dir)
    }
}

/// Platform cache directory for this tool
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("litsearch")
}

/// Load configuration from `litsearch.toml` (optional) and `LITSEARCH_*`
/// environment variables. Nested keys use `__`, e.g.
/// `LITSEARCH_API_KEYS__SCOPUS`.
pub fn load_config() -> Result<Config, config::ConfigError> {
    config::Config::builder()
        .add_source(config::File::with_name("litsearch").required(false))
        .add_source(
            config::Environment::with_prefix("LITSEARCH")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
}
