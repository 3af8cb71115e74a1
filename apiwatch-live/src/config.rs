//! Dashboard configuration
//!
//! Defines the connection settings, refresh intervals and page sizes used
//! by the live views.

use std::time::Duration;

/// Longest accepted interval or delay (one day)
pub const MAX_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Dashboard configuration
///
/// Intervals are configurable so slow links can back off, but the defaults
/// match what the server-side dashboard uses.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server base URL (e.g., "http://localhost:8000")
    pub base_url: String,

    /// Delay before reconnecting a dropped log stream
    pub reconnect_delay: Duration,

    /// How often the job list is refreshed
    pub poll_interval: Duration,

    /// How often auto-refreshing views (log list, job log viewer) refetch
    pub refresh_interval: Duration,

    /// How many request log entries to fetch when listing
    pub log_limit: usize,

    /// Maximum number of job log lines fetched by the viewer
    pub job_log_limit: usize,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            reconnect_delay: Duration::from_secs(3),
            poll_interval: Duration::from_secs(3),
            refresh_interval: Duration::from_secs(5),
            log_limit: 100,
            job_log_limit: 10_000,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - APIWATCH_URL (required)
    /// - APIWATCH_RECONNECT_DELAY (optional, seconds, default: 3)
    /// - APIWATCH_POLL_INTERVAL (optional, seconds, default: 3)
    /// - APIWATCH_REFRESH_INTERVAL (optional, seconds, default: 5)
    /// - APIWATCH_LOG_LIMIT (optional, default: 100)
    /// - APIWATCH_JOB_LOG_LIMIT (optional, default: 10000)
    pub fn from_env() -> anyhow::Result<Self> {
        let base_url = std::env::var("APIWATCH_URL")
            .map_err(|_| anyhow::anyhow!("APIWATCH_URL environment variable not set"))?;

        Ok(Self::new(base_url).with_env_overrides())
    }

    /// Applies the optional interval and limit variables on top of `self`
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies interval and limit overrides read through `lookup`
    ///
    /// Unset or unparsable values keep the current setting.
    pub fn with_overrides(self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parse = |key: &str| lookup(key).and_then(|value| value.trim().parse::<u64>().ok());
        let secs = |key: &str| parse(key).map(Duration::from_secs);

        Self {
            reconnect_delay: secs("APIWATCH_RECONNECT_DELAY").unwrap_or(self.reconnect_delay),
            poll_interval: secs("APIWATCH_POLL_INTERVAL").unwrap_or(self.poll_interval),
            refresh_interval: secs("APIWATCH_REFRESH_INTERVAL").unwrap_or(self.refresh_interval),
            log_limit: parse("APIWATCH_LOG_LIMIT")
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(self.log_limit),
            job_log_limit: parse("APIWATCH_JOB_LOG_LIMIT")
                .and_then(|n| usize::try_from(n).ok())
                .unwrap_or(self.job_log_limit),
            ..self
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.base_url.is_empty() {
            anyhow::bail!("base_url cannot be empty");
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            anyhow::bail!("base_url must start with http:// or https://");
        }

        if self.reconnect_delay.is_zero() {
            anyhow::bail!("reconnect_delay must be greater than 0");
        }

        if self.poll_interval.is_zero() {
            anyhow::bail!("poll_interval must be greater than 0");
        }

        if self.refresh_interval.is_zero() {
            anyhow::bail!("refresh_interval must be greater than 0");
        }

        for (name, interval) in [
            ("reconnect_delay", self.reconnect_delay),
            ("poll_interval", self.poll_interval),
            ("refresh_interval", self.refresh_interval),
        ] {
            if interval > MAX_INTERVAL {
                anyhow::bail!("{} must be at most {} seconds", name, MAX_INTERVAL.as_secs());
            }
        }

        if self.log_limit == 0 || self.job_log_limit == 0 {
            anyhow::bail!("log limits must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("http://localhost:8000".to_string())
    }
}
