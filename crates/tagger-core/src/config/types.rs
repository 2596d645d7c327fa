//! Sub-configuration structs and their defaults.

use serde::{Serialize, Serializer};
use std::path::PathBuf;

/// Default lifetime of a presigned URL, in seconds.
pub const DEFAULT_PRESIGN_EXPIRES_SECS: u64 = 1800;

/// Upper bound SigV4 accepts for a presigned URL (7 days).
pub const MAX_PRESIGN_EXPIRES_SECS: u64 = 604_800;

/// Local model directories.
#[derive(Debug, Clone, Serialize)]
pub struct ModelConfig {
    /// Reasoning model (QVQ) directory
    pub qvq_model_path: PathBuf,

    /// Default vision-language model (Qwen2.5-VL) directory
    pub qwen_model_path: PathBuf,
}

/// Model hub download settings.
#[derive(Debug, Clone, Serialize)]
pub struct HubConfig {
    /// Repository id to download, e.g. "Qwen/Qwen2.5-VL-7B-Instruct"
    pub repo_to_download: String,

    /// Local directory the repository is materialized into
    pub path_to_save: PathBuf,

    /// Hub base URL
    pub endpoint: String,

    /// Repository revision (branch, tag or commit)
    pub revision: String,

    /// Bearer token for gated repositories
    #[serde(serialize_with = "redact")]
    pub token: Option<String>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            repo_to_download: String::new(),
            path_to_save: PathBuf::new(),
            endpoint: "https://huggingface.co".to_string(),
            revision: "main".to_string(),
            token: None,
        }
    }
}

/// S3-compatible object storage settings.
#[derive(Debug, Clone, Serialize)]
pub struct StorageConfig {
    /// Access key id
    pub access_key: String,

    /// Secret access key
    #[serde(serialize_with = "redact_str")]
    pub secret_key: String,

    /// Endpoint URL
    pub endpoint: String,

    /// Bucket holding the images
    pub bucket: String,

    /// Prefix selecting the images to process
    pub list_prefix: String,

    /// Signing region
    pub region: String,

    /// Use path-style instead of virtual-hosted addressing
    pub force_path_style: bool,

    /// Presigned URL lifetime in seconds
    pub presign_expires_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            access_key: String::new(),
            secret_key: String::new(),
            endpoint: String::new(),
            bucket: String::new(),
            list_prefix: String::new(),
            region: "us-east-1".to_string(),
            force_path_style: false,
            presign_expires_secs: DEFAULT_PRESIGN_EXPIRES_SECS,
        }
    }
}

/// OpenAI-compatible inference server settings.
#[derive(Debug, Clone, Serialize)]
pub struct VlmConfig {
    /// Base URL, e.g. "http://127.0.0.1:8000/v1"
    pub endpoint: String,

    /// Bearer token, if the server requires one
    #[serde(serialize_with = "redact")]
    pub api_key: Option<String>,

    /// Served model name; defaults to the model path (vLLM's default)
    pub served_model: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum number of generated tokens
    pub max_new_tokens: u32,
}

impl Default for VlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000/v1".to_string(),
            api_key: None,
            served_model: None,
            timeout_secs: 1800,
            max_new_tokens: 4096 * 3,
        }
    }
}

/// Output settings.
#[derive(Debug, Clone, Serialize)]
pub struct OutputConfig {
    /// Directory receiving one JSON record per image
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

fn redact<S: Serializer>(value: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(_) => s.serialize_str("********"),
        None => s.serialize_none(),
    }
}

fn redact_str<S: Serializer>(value: &str, s: S) -> Result<S::Ok, S::Error> {
    if value.is_empty() {
        s.serialize_str("")
    } else {
        s.serialize_str("********")
    }
}
