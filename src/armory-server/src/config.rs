//! Server configuration
//!
//! Resolver settings come from an optional TOML file; everything else is
//! taken from the command line or environment.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use armory::{ClientConfig, ResolverConfig};

/// Debug dump directory used by `--dev` when none is given
pub const DEV_DEBUG_DIR: &str = "debug";

/// Load resolver settings from `path`, or defaults when no file is given
pub fn load_resolver_config(path: Option<&Path>) -> Result<ResolverConfig> {
    let Some(path) = path else {
        return Ok(ResolverConfig::default());
    };

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;

    toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

/// Where debug dumps go, if anywhere
pub fn debug_dir(explicit: Option<PathBuf>, dev: bool) -> Option<PathBuf> {
    explicit.or_else(|| dev.then(|| PathBuf::from(DEV_DEBUG_DIR)))
}

/// Content client settings whose request timeout matches the resolver's
pub fn client_config(resolver: &ResolverConfig, api_key: String, base_url: String) -> ClientConfig {
    ClientConfig {
        base_url,
        ..ClientConfig::new(api_key)
    }
    .with_timeout(resolver.fetch_timeout())
}
