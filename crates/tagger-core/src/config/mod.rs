//! Configuration management for tagger.
//!
//! Configuration comes from environment variables, optionally seeded from a
//! `.env` file in the working directory. It is built once at startup and
//! passed by reference into every component; nothing reads the environment
//! after that.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::Serialize;
use std::path::PathBuf;

/// Environment variables that must be present for the process to start.
pub const REQUIRED_VARS: [&str; 9] = [
    "QVQ_MODEL_PATH",
    "QWEN_MODEL_PATH",
    "REPO_TO_DOWNLOAD",
    "PATH_TO_SAVE",
    "S3_AK",
    "S3_SK",
    "S3_ENDPOINT",
    "S3_BUCKET",
    "S3_LIST_PREFIX",
];

/// Root configuration structure.
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Local model directories
    pub model: ModelConfig,

    /// Model hub download settings
    pub hub: HubConfig,

    /// Object storage settings
    pub storage: StorageConfig,

    /// Inference server settings
    pub vlm: VlmConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// A `.env` file in the working directory is loaded first if present;
    /// variables already set in the environment take precedence.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Fails on the first required variable the lookup cannot resolve.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup: &lookup };

        let model = ModelConfig {
            qvq_model_path: expand_path(&env.required("QVQ_MODEL_PATH")?),
            qwen_model_path: expand_path(&env.required("QWEN_MODEL_PATH")?),
        };

        let hub_defaults = HubConfig::default();
        let hub = HubConfig {
            repo_to_download: env.required("REPO_TO_DOWNLOAD")?,
            path_to_save: expand_path(&env.required("PATH_TO_SAVE")?),
            endpoint: env.optional("HF_ENDPOINT").unwrap_or(hub_defaults.endpoint),
            revision: env.optional("HF_REVISION").unwrap_or(hub_defaults.revision),
            token: env.optional("HF_TOKEN"),
        };

        let storage_defaults = StorageConfig::default();
        let storage = StorageConfig {
            access_key: env.required("S3_AK")?,
            secret_key: env.required("S3_SK")?,
            endpoint: env.required("S3_ENDPOINT")?,
            bucket: env.required("S3_BUCKET")?,
            list_prefix: env.required("S3_LIST_PREFIX")?,
            region: env.optional("S3_REGION").unwrap_or(storage_defaults.region),
            force_path_style: env
                .parsed("S3_FORCE_PATH_STYLE")?
                .unwrap_or(storage_defaults.force_path_style),
            presign_expires_secs: env
                .parsed("PRESIGN_EXPIRES_SECS")?
                .unwrap_or(storage_defaults.presign_expires_secs),
        };

        let vlm_defaults = VlmConfig::default();
        let vlm = VlmConfig {
            endpoint: env.optional("VLM_ENDPOINT").unwrap_or(vlm_defaults.endpoint),
            api_key: env.optional("VLM_API_KEY"),
            served_model: env.optional("VLM_SERVED_MODEL"),
            timeout_secs: env
                .parsed("VLM_TIMEOUT_SECS")?
                .unwrap_or(vlm_defaults.timeout_secs),
            max_new_tokens: env
                .parsed("VLM_MAX_NEW_TOKENS")?
                .unwrap_or(vlm_defaults.max_new_tokens),
        };

        let output = OutputConfig {
            dir: env
                .optional("OUTPUT_DIR")
                .map(|dir| expand_path(&dir))
                .unwrap_or_else(|| OutputConfig::default().dir),
        };

        let logging_defaults = LoggingConfig::default();
        let logging = LoggingConfig {
            level: env.optional("LOG_LEVEL").unwrap_or(logging_defaults.level),
            format: env.optional("LOG_FORMAT").unwrap_or(logging_defaults.format),
        };

        let config = Config {
            model,
            hub,
            storage,
            vlm,
            output,
            logging,
        };
        config.validate()?;
        Ok(config)
    }

    /// Serialize the config to a pretty TOML string, secrets redacted.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

/// Thin wrapper giving the lookup closure required/optional/parsed accessors.
struct Env<'a, F: Fn(&str) -> Option<String>> {
    lookup: &'a F,
}

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        (self.lookup)(name).ok_or(ConfigError::MissingVar(name))
    }

    /// Unset and empty values both count as absent.
    fn optional(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.trim().is_empty())
    }

    fn parsed<T>(&self, name: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match self.optional(name) {
            None => Ok(None),
            Some(value) => value
                .trim()
                .parse()
                .map(Some)
                .map_err(|e: T::Err| ConfigError::InvalidVar {
                    name,
                    value,
                    reason: e.to_string(),
                }),
        }
    }
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    pub(crate) fn base_vars() -> HashMap<&'static str, String> {
        [
            ("QVQ_MODEL_PATH", "/models/QVQ-72B-Preview"),
            ("QWEN_MODEL_PATH", "/models/Qwen2.5-VL-7B-Instruct"),
            ("REPO_TO_DOWNLOAD", "Qwen/Qwen2.5-VL-7B-Instruct"),
            ("PATH_TO_SAVE", "/models/Qwen2.5-VL-7B-Instruct"),
            ("S3_AK", "AKIDEXAMPLE"),
            ("S3_SK", "wJalrXUtnFEMI/K7MDENG"),
            ("S3_ENDPOINT", "https://s3.example.com"),
            ("S3_BUCKET", "illustrations"),
            ("S3_LIST_PREFIX", "processed_1080_png/charts/"),
        ]
        .into_iter()
        .map(|(k, v)| (k, v.to_string()))
        .collect()
    }

    pub(crate) fn test_config() -> Config {
        let vars = base_vars();
        Config::from_lookup(|name| vars.get(name).cloned()).unwrap()
    }

    #[test]
    fn test_loads_required_vars_with_defaults() {
        let config = test_config();
        assert_eq!(config.storage.bucket, "illustrations");
        assert_eq!(config.storage.list_prefix, "processed_1080_png/charts/");
        assert_eq!(config.storage.presign_expires_secs, 1800);
        assert_eq!(config.storage.region, "us-east-1");
        assert!(!config.storage.force_path_style);
        assert_eq!(config.vlm.max_new_tokens, 12288);
        assert_eq!(config.output.dir, PathBuf::from("output"));
        assert_eq!(
            config.model.qwen_model_path,
            PathBuf::from("/models/Qwen2.5-VL-7B-Instruct")
        );
    }

    #[test]
    fn test_each_missing_var_is_reported() {
        for missing in REQUIRED_VARS {
            let mut vars = base_vars();
            vars.remove(missing);
            let err = Config::from_lookup(|name| vars.get(name).cloned()).unwrap_err();
            match err {
                ConfigError::MissingVar(name) => assert_eq!(name, missing),
                other => panic!("expected MissingVar({missing}), got {other}"),
            }
        }
    }

    #[test]
    fn test_empty_required_var_is_accepted() {
        // An empty prefix lists the whole bucket.
        let mut vars = base_vars();
        vars.insert("S3_LIST_PREFIX", String::new());
        let config = Config::from_lookup(|name| vars.get(name).cloned()).unwrap();
        assert_eq!(config.storage.list_prefix, "");
    }

    #[test]
    fn test_optional_overrides() {
        let mut vars = base_vars();
        vars.insert("PRESIGN_EXPIRES_SECS", "600".into());
        vars.insert("S3_FORCE_PATH_STYLE", "true".into());
        vars.insert("VLM_ENDPOINT", "http://gpu-01:8000/v1".into());
        vars.insert("VLM_SERVED_MODEL", "qwen2.5-vl".into());
        vars.insert("OUTPUT_DIR", "/tmp/tags".into());
        let config = Config::from_lookup(|name| vars.get(name).cloned()).unwrap();
        assert_eq!(config.storage.presign_expires_secs, 600);
        assert!(config.storage.force_path_style);
        assert_eq!(config.vlm.endpoint, "http://gpu-01:8000/v1");
        assert_eq!(config.vlm.served_model.as_deref(), Some("qwen2.5-vl"));
        assert_eq!(config.output.dir, PathBuf::from("/tmp/tags"));
    }

    #[test]
    fn test_unparseable_optional_var() {
        let mut vars = base_vars();
        vars.insert("VLM_TIMEOUT_SECS", "soon".into());
        let err = Config::from_lookup(|name| vars.get(name).cloned()).unwrap_err();
        assert!(err.to_string().contains("VLM_TIMEOUT_SECS"));
    }

    #[test]
    fn test_to_toml_redacts_secrets() {
        let mut vars = base_vars();
        vars.insert("VLM_API_KEY", "sk-live-123".into());
        let config = Config::from_lookup(|name| vars.get(name).cloned()).unwrap();
        let toml = config.to_toml().unwrap();
        assert!(toml.contains("[storage]"));
        assert!(toml.contains("illustrations"));
        assert!(!toml.contains("wJalrXUtnFEMI"));
        assert!(!toml.contains("sk-live-123"));
    }
}
