//! Index configuration via `mosaic-index.toml`
//!
//! A small set of operational tunables loaded from a TOML file next to
//! the deployment's data/config directory. Missing file ⇒ defaults;
//! present-but-invalid file is an error (a silently ignored typo in a
//! TTL is worse than a refused start). Unknown keys are rejected.

use mosaic_index_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Config file name looked up by [`IndexConfig::load_or_default`].
pub const CONFIG_FILE_NAME: &str = "mosaic-index.toml";

/// Operational tunables for the index subsystem.
///
/// # Example
///
/// ```toml
/// # Seconds a cached thumbnail payload stays servable
/// thumbnail_ttl_secs = 604800
///
/// # Seconds the dashboard aggregate is trusted before recompute
/// dashboard_freshness_secs = 300
///
/// # Page size used when a caller passes 0
/// default_page_size = 24
///
/// # Hard ceiling on requested page sizes
/// max_page_size = 100
///
/// # Thumbnail payloads per batch write during rebuild
/// thumbnail_batch_size = 64
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    /// Seconds a cached thumbnail payload stays servable.
    #[serde(default = "default_thumbnail_ttl_secs")]
    pub thumbnail_ttl_secs: u64,
    /// Seconds the dashboard aggregate is trusted before recompute.
    #[serde(default = "default_dashboard_freshness_secs")]
    pub dashboard_freshness_secs: u64,
    /// Page size used when a caller passes 0.
    #[serde(default = "default_page_size")]
    pub default_page_size: u64,
    /// Hard ceiling on requested page sizes.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u64,
    /// Thumbnail payloads per batch write during rebuild.
    #[serde(default = "default_thumbnail_batch_size")]
    pub thumbnail_batch_size: usize,
}

fn default_thumbnail_ttl_secs() -> u64 {
    7 * 24 * 60 * 60
}

fn default_dashboard_freshness_secs() -> u64 {
    300
}

fn default_page_size() -> u64 {
    24
}

fn default_max_page_size() -> u64 {
    100
}

fn default_thumbnail_batch_size() -> usize {
    64
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            thumbnail_ttl_secs: default_thumbnail_ttl_secs(),
            dashboard_freshness_secs: default_dashboard_freshness_secs(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            thumbnail_batch_size: default_thumbnail_batch_size(),
        }
    }
}

impl IndexConfig {
    /// Parse a TOML document. Absent keys take defaults; unknown keys
    /// are rejected.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] on parse failure.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    /// Load from `dir/mosaic-index.toml`, falling back to defaults when
    /// the file does not exist.
    ///
    /// # Errors
    /// Returns [`Error::InvalidConfig`] when the file exists but cannot
    /// be read or parsed.
    pub fn load_or_default(dir: impl AsRef<Path>) -> Result<Self> {
        let path = dir.as_ref().join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(&path)
            .map_err(|e| Error::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&raw)
    }

    /// Thumbnail TTL as a duration; `None` disables expiration.
    pub fn thumbnail_ttl(&self) -> Option<Duration> {
        (self.thumbnail_ttl_secs > 0).then(|| Duration::from_secs(self.thumbnail_ttl_secs))
    }

    /// Dashboard freshness window as a duration.
    pub fn dashboard_freshness(&self) -> Duration {
        Duration::from_secs(self.dashboard_freshness_secs)
    }
}
