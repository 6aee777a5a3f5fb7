//! Configuration for sentinel-sync

use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Name of the optional configuration file (any extension `config` knows).
pub const CONFIG_FILE: &str = "sentinel-sync";

/// Prefix for environment overrides, e.g. `SENTINEL_SYNC__ZK_HOSTS`.
pub const ENV_PREFIX: &str = "SENTINEL_SYNC";

/// Global configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Directory holding the Sentinel monitor definitions
    #[serde(default)]
    pub include_dir: PathBuf,

    /// ZooKeeper connection string (`host:port,host:port`)
    #[serde(default)]
    pub zk_hosts: String,

    /// Root under which `{group}/master/master` nodes live
    #[serde(default = "default_zk_root")]
    pub zk_root: String,

    /// ZooKeeper session timeout
    #[serde(default = "default_session_timeout")]
    pub session_timeout_ms: u64,

    /// Host of the local Sentinel
    #[serde(default = "default_sentinel_host")]
    pub sentinel_host: String,

    /// Port of the local Sentinel
    #[serde(default = "default_sentinel_port")]
    pub sentinel_port: u16,

    /// Interval between refresh passes
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,

    /// Attempts the write protocol makes before giving up
    #[serde(default = "default_retry_budget")]
    pub retry_budget: u32,

    /// Pause between write attempts
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_zk_root() -> String {
    "/zk/redis_sentinel".to_string()
}
fn default_session_timeout() -> u64 {
    10_000
}
fn default_sentinel_host() -> String {
    "127.0.0.1".to_string()
}
fn default_sentinel_port() -> u16 {
    26379
}
fn default_refresh_interval() -> u64 {
    10
}
fn default_retry_budget() -> u32 {
    3
}
fn default_retry_backoff() -> u64 {
    1000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            include_dir: PathBuf::new(),
            zk_hosts: String::new(),
            zk_root: default_zk_root(),
            session_timeout_ms: default_session_timeout(),
            sentinel_host: default_sentinel_host(),
            sentinel_port: default_sentinel_port(),
            refresh_interval_secs: default_refresh_interval(),
            retry_budget: default_retry_budget(),
            retry_backoff_ms: default_retry_backoff(),
            log_level: default_log_level(),
        }
    }
}

impl SyncConfig {
    /// Load from the optional `sentinel-sync.*` file, then `SENTINEL_SYNC__*` env vars.
    pub fn load() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(CONFIG_FILE).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Reject settings no mode can run with.
    pub fn validate(&self) -> Result<()> {
        if self.zk_hosts.trim().is_empty() {
            return Err(Error::Config("zk_hosts must not be empty".into()));
        }
        if !self.zk_root.starts_with('/') {
            return Err(Error::Config(format!(
                "zk_root must be absolute, got '{}'",
                self.zk_root
            )));
        }
        if self.retry_budget == 0 {
            return Err(Error::Config("retry_budget must be at least 1".into()));
        }
        if self.refresh_interval_secs == 0 {
            return Err(Error::Config("refresh_interval_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Set the refresh interval; only whole, non-zero seconds are accepted.
    pub fn set_refresh_interval(&mut self, interval: Duration) -> Result<()> {
        if interval.subsec_nanos() != 0 || interval.as_secs() == 0 {
            return Err(Error::Config(format!(
                "refresh interval must be a whole number of seconds (at least 1s), got {:?}",
                interval
            )));
        }
        self.refresh_interval_secs = interval.as_secs();
        Ok(())
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn session_timeout(&self) -> Duration {
        Duration::from_millis(self.session_timeout_ms)
    }

    /// Root with any trailing slash removed.
    pub fn root(&self) -> &str {
        let trimmed = self.zk_root.trim_end_matches('/');
        if trimmed.is_empty() {
            "/"
        } else {
            trimmed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> SyncConfig {
        SyncConfig {
            zk_hosts: "zk1:2181,zk2:2181".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.zk_root, "/zk/redis_sentinel");
        assert_eq!(config.refresh_interval(), Duration::from_secs(10));
        assert_eq!(config.retry_budget, 3);
        assert_eq!(config.retry_backoff(), Duration::from_secs(1));
    }

    #[test]
    fn test_validate() {
        assert!(valid().validate().is_ok());

        let mut config = valid();
        config.zk_hosts = "  ".into();
        assert!(config.validate().is_err());

        let mut config = valid();
        config.retry_budget = 0;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.refresh_interval_secs = 0;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.zk_root = "relative/root".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_set_refresh_interval() {
        let mut config = valid();
        config.set_refresh_interval(Duration::from_secs(30)).unwrap();
        assert_eq!(config.refresh_interval_secs, 30);
        config.set_refresh_interval(Duration::from_millis(2000)).unwrap();
        assert_eq!(config.refresh_interval_secs, 2);

        // Sub-second parts are rejected rather than truncated.
        assert!(config.set_refresh_interval(Duration::from_millis(1500)).is_err());
        assert!(config.set_refresh_interval(Duration::from_millis(500)).is_err());
        assert!(config.set_refresh_interval(Duration::ZERO).is_err());
        assert_eq!(config.refresh_interval_secs, 2);
    }

    #[test]
    fn test_root_trims_trailing_slash() {
        let mut config = valid();
        config.zk_root = "/zk/redis_sentinel/".into();
        assert_eq!(config.root(), "/zk/redis_sentinel");
    }

    #[test]
    fn test_deserialize_partial() {
        let config: SyncConfig =
            serde_json::from_str(r#"{"zk_hosts":"zk:2181","sentinel_port":26380}"#).unwrap();
        assert_eq!(config.zk_hosts, "zk:2181");
        assert_eq!(config.sentinel_port, 26380);
        assert_eq!(config.sentinel_host, "127.0.0.1");
    }
}
