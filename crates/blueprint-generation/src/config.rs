//! Generation client configuration
//!
//! Loaded from a JSON file; missing fields and a missing file fall back to
//! the defaults in [`crate::constants`].

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::constants::{endpoints, polling, push};
use crate::error::{GenerationError, Result};

/// Settings for talking to the generation service and tracking jobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Base URL of the generation service (no trailing slash)
    pub base_url: String,
    /// Seconds between status queries
    pub poll_interval_secs: u64,
    /// Cap on the backoff delay after failed queries
    pub backoff_max_secs: u64,
    /// Give up polling after this many consecutive failures (None = never)
    pub max_consecutive_poll_failures: Option<u32>,
    /// Ask the service to cancel a job when its review is rejected
    pub cancel_remote_on_reject: bool,
    /// Bounded queue size for push events
    pub push_channel_capacity: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: endpoints::DEFAULT_BASE_URL.to_string(),
            poll_interval_secs: polling::INTERVAL_SECS,
            backoff_max_secs: polling::BACKOFF_MAX_SECS,
            max_consecutive_poll_failures: Some(polling::MAX_CONSECUTIVE_FAILURES),
            cancel_remote_on_reject: false,
            push_channel_capacity: push::CHANNEL_CAPACITY,
        }
    }
}

impl GenerationConfig {
    /// Load configuration from a JSON file
    ///
    /// A missing file yields the defaults. The base URL environment
    /// variable overrides whatever the file says.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if fs::try_exists(path).await? {
            let content = fs::read_to_string(path).await?;
            let config: Self = serde_json::from_str(&content)?;
            log::info!("Loaded generation config from {:?}", path);
            config
        } else {
            log::debug!("No generation config at {:?}, using defaults", path);
            Self::default()
        };
        if let Ok(url) = std::env::var(endpoints::BASE_URL_ENV) {
            config.base_url = url;
        }
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?).await?;
        Ok(())
    }

    /// Check values that would make the orchestrator misbehave
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(GenerationError::Config("base_url is empty".into()));
        }
        if self.poll_interval_secs == 0 {
            return Err(GenerationError::Config(
                "poll_interval_secs must be at least 1".into(),
            ));
        }
        if self.backoff_max_secs < self.poll_interval_secs {
            return Err(GenerationError::Config(
                "backoff_max_secs must not be below poll_interval_secs".into(),
            ));
        }
        if self.push_channel_capacity == 0 {
            return Err(GenerationError::Config(
                "push_channel_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Interval between status queries, never below one second
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs())
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_secs(self.backoff_max_secs)
    }

    /// Delay before the next query after `failures` consecutive failures
    ///
    /// Doubles from the poll interval and saturates at `backoff_max`.
    pub fn backoff_delay(&self, failures: u32) -> Duration {
        if failures == 0 {
            return self.poll_interval();
        }
        let factor = 1u64.checked_shl(failures.min(32)).unwrap_or(u64::MAX);
        let secs = self.interval_secs().saturating_mul(factor);
        Duration::from_secs(secs.min(self.backoff_max_secs).max(self.interval_secs()))
    }

    fn interval_secs(&self) -> u64 {
        self.poll_interval_secs.max(polling::MIN_INTERVAL_SECS)
    }

    /// Base URL without a trailing slash
    pub fn api_root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_delay() {
        let config = GenerationConfig::default();
        assert_eq!(config.backoff_delay(0), Duration::from_secs(3));
        assert_eq!(config.backoff_delay(1), Duration::from_secs(6));
        assert_eq!(config.backoff_delay(2), Duration::from_secs(12));
        assert_eq!(config.backoff_delay(4), Duration::from_secs(48));
        assert_eq!(config.backoff_delay(5), Duration::from_secs(60));
        assert_eq!(config.backoff_delay(500), Duration::from_secs(60));
    }

    #[test]
    fn test_zero_interval_is_floored() {
        let config = GenerationConfig {
            poll_interval_secs: 0,
            backoff_max_secs: 0,
            ..GenerationConfig::default()
        };
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.backoff_delay(0), Duration::from_secs(1));
        assert_eq!(config.backoff_delay(3), Duration::from_secs(1));
    }

    #[test]
    fn test_validate() {
        assert!(GenerationConfig::default().validate().is_ok());

        let config = GenerationConfig {
            poll_interval_secs: 0,
            ..GenerationConfig::default()
        };
        assert!(matches!(config.validate(), Err(GenerationError::Config(_))));

        let config = GenerationConfig {
            backoff_max_secs: 1,
            ..GenerationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: GenerationConfig =
            serde_json::from_str(r#"{"base_url":"https://gen.example.com/"}"#).unwrap();
        assert_eq!(config.api_root(), "https://gen.example.com");
        assert_eq!(config.poll_interval_secs, 3);
        assert!(!config.cancel_remote_on_reject);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("generation.json");

        let missing = GenerationConfig::load(&path).await.unwrap();
        assert_eq!(missing.poll_interval_secs, GenerationConfig::default().poll_interval_secs);

        let config = GenerationConfig {
            poll_interval_secs: 5,
            cancel_remote_on_reject: true,
            ..GenerationConfig::default()
        };
        config.save(&path).await.unwrap();

        let loaded = GenerationConfig::load(&path).await.unwrap();
        assert_eq!(loaded.poll_interval_secs, 5);
        assert!(loaded.cancel_remote_on_reject);
    }
}
