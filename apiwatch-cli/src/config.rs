//! Configuration module
//!
//! Resolves the live-view configuration for the server given on the
//! command line.

use anyhow::{Context, Result};
use apiwatch_live::Config;

/// Builds the configuration for `url`
///
/// Intervals and limits come from the environment when set; the URL flag
/// always wins over `APIWATCH_URL`.
pub fn load(url: &str) -> Result<Config> {
    let config = Config::new(url.trim_end_matches('/').to_string()).with_env_overrides();
    config.validate().context("Invalid configuration")?;
    Ok(config)
}
