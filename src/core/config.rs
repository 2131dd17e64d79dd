//! Engine configuration with layered loading
//!
//! Priority order: built-in defaults, then an optional YAML file, then
//! environment variables.

use std::path::Path;
use std::time::Duration;

use miette::{IntoDiagnostic, Result};
use serde::Deserialize;

/// Retry policy for transient service failures at the fetch layer
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per fetch, including the first
    pub max_attempts: u32,

    /// Delay before the first retry; doubles on each further retry
    pub base_delay_ms: u64,

    /// Upper bound on any single delay
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 50,
            max_delay_ms: 2000,
        }
    }
}

impl RetryConfig {
    /// Backoff delay before retry number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        let ms = self.base_delay_ms.saturating_mul(1u64 << shift);
        Duration::from_millis(ms.min(self.max_delay_ms))
    }
}

/// Engine configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub retry: RetryConfig,
}

impl EngineConfig {
    /// Parse configuration from a YAML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).into_diagnostic()?;
        serde_yml::from_str(&contents).into_diagnostic()
    }

    /// Best-effort load: the file if given and readable, then environment
    /// overrides on top. Falls back to defaults on any file problem.
    pub fn load(path: Option<&Path>) -> Self {
        let mut config = match path {
            Some(p) if p.exists() => Self::load_from(p).unwrap_or_default(),
            _ => Self::default(),
        };
        config.apply_env();
        config
    }

    /// Apply `SWITCHYARD_*` environment overrides
    fn apply_env(&mut self) {
        if let Ok(value) = std::env::var("SWITCHYARD_RETRY_MAX_ATTEMPTS") {
            if let Ok(parsed) = value.parse() {
                self.retry.max_attempts = parsed;
            }
        }
        if let Ok(value) = std::env::var("SWITCHYARD_RETRY_BASE_DELAY_MS") {
            if let Ok(parsed) = value.parse() {
                self.retry.base_delay_ms = parsed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay_ms, 50);
    }

    #[test]
    fn test_delay_doubles_and_caps() {
        let retry = RetryConfig {
            max_attempts: 5,
            base_delay_ms: 100,
            max_delay_ms: 350,
        };
        assert_eq!(retry.delay_for(1), Duration::from_millis(100));
        assert_eq!(retry.delay_for(2), Duration::from_millis(200));
        // 400ms capped at 350ms
        assert_eq!(retry.delay_for(3), Duration::from_millis(350));
    }

    #[test]
    fn test_load_from_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "retry:\n  max_attempts: 7").unwrap();

        let config = EngineConfig::load_from(file.path()).unwrap();
        assert_eq!(config.retry.max_attempts, 7);
        // unspecified fields keep their defaults
        assert_eq!(config.retry.base_delay_ms, 50);
    }

    #[test]
    fn test_load_missing_file_falls_back_to_defaults() {
        let config = EngineConfig::load(Some(Path::new("/nonexistent/switchyard.yaml")));
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_env_override() {
        std::env::set_var("SWITCHYARD_RETRY_MAX_ATTEMPTS", "9");
        let config = EngineConfig::load(None);
        std::env::remove_var("SWITCHYARD_RETRY_MAX_ATTEMPTS");
        assert_eq!(config.retry.max_attempts, 9);
    }
}
