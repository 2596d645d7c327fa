//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::{Config, MAX_PRESIGN_EXPIRES_SECS};

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.bucket.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "S3_BUCKET must not be empty".into(),
            ));
        }
        if self.storage.presign_expires_secs == 0
            || self.storage.presign_expires_secs > MAX_PRESIGN_EXPIRES_SECS
        {
            return Err(ConfigError::ValidationError(format!(
                "PRESIGN_EXPIRES_SECS must be between 1 and {MAX_PRESIGN_EXPIRES_SECS}"
            )));
        }
        if self.vlm.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "VLM_TIMEOUT_SECS must be > 0".into(),
            ));
        }
        if self.vlm.max_new_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "VLM_MAX_NEW_TOKENS must be > 0".into(),
            ));
        }
        if !LOG_LEVELS
            .iter()
            .any(|level| level.eq_ignore_ascii_case(&self.logging.level))
        {
            return Err(ConfigError::ValidationError(format!(
                "LOG_LEVEL must be one of {}, got {:?}",
                LOG_LEVELS.join(", "),
                self.logging.level
            )));
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(format!(
                "LOG_FORMAT must be \"pretty\" or \"json\", got {:?}",
                self.logging.format
            )));
        }
        Ok(())
    }
}
