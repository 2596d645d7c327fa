//! Error types for the tagger pipeline.
//!
//! Errors are organized by stage so callers can tell startup failures
//! (configuration, model download, model load, listing) apart from the
//! per-item failures the batch runner logs and skips.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for tagger operations.
#[derive(Error, Debug)]
pub enum TaggerError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Object storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Model hub download errors
    #[error("Model download error: {0}")]
    Hub(#[from] HubError),

    /// Model load / inference errors
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// Per-item pipeline errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TaggerError {
    /// Whether this error aborts a whole run rather than a single item.
    pub fn is_fatal(&self) -> bool {
        match self {
            TaggerError::Config(_) | TaggerError::Hub(_) => true,
            TaggerError::Model(e) => matches!(e, ModelError::Load { .. }),
            TaggerError::Storage(e) => matches!(e, StorageError::List { .. }),
            TaggerError::Pipeline(_) => false,
            TaggerError::Io(_) | TaggerError::Json(_) => true,
        }
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required environment variable is not set
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// An optional environment variable holds an unparseable value
    #[error("Invalid value for {name}: {value:?} ({reason})")]
    InvalidVar {
        name: &'static str,
        value: String,
        reason: String,
    },

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Object storage errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Listing keys under a prefix failed
    #[error("Listing s3://{bucket}/{prefix} failed: {message}")]
    List {
        bucket: String,
        prefix: String,
        message: String,
    },

    /// Generating a presigned URL failed
    #[error("Presigning {key} failed: {message}")]
    Presign { key: String, message: String },
}

/// Model hub download errors.
#[derive(Error, Debug)]
pub enum HubError {
    /// HTTP request to the hub failed
    #[error("Request to {url} failed: {message}")]
    Request {
        url: String,
        message: String,
        status_code: Option<u16>,
    },

    /// Hub returned a file name that would escape the destination directory
    #[error("Refusing to write outside destination directory: {0}")]
    UnsafePath(String),

    /// Writing a downloaded file failed
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Model load and inference errors.
#[derive(Error, Debug)]
pub enum ModelError {
    /// The model could not be loaded (missing files, server not serving it)
    #[error("Failed to load model {model}: {message}")]
    Load { model: String, message: String },

    /// `generate` was called before `load`
    #[error("Model not loaded; call load() before generate()")]
    NotLoaded,

    /// Inference request failed
    #[error("Inference request failed: {message}")]
    Request {
        message: String,
        status_code: Option<u16>,
    },

    /// The backend returned a different number of outputs than images sent
    #[error("Expected {expected} generated output(s), got {actual}")]
    UnexpectedOutputCount { expected: usize, actual: usize },
}

/// Output record construction errors.
#[derive(Error, Debug)]
pub enum RecordError {
    /// The generator produced no text for the image
    #[error("Description for {key} is empty; cannot derive tags")]
    EmptyDescription { key: String },

    /// The object key has no usable file name
    #[error("Cannot derive a file name from key {0:?}")]
    InvalidKey(String),
}

/// A failure while processing one object key.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Presigning the key failed
    #[error("{key}: {source}")]
    Presign {
        key: String,
        #[source]
        source: StorageError,
    },

    /// Generation failed
    #[error("{key}: {source}")]
    Generate {
        key: String,
        #[source]
        source: ModelError,
    },

    /// The record could not be built
    #[error("{key}: {source}")]
    Record {
        key: String,
        #[source]
        source: RecordError,
    },

    /// Writing the record failed
    #[error("{key}: failed to write {path}: {message}")]
    Write {
        key: String,
        path: PathBuf,
        message: String,
    },
}

impl PipelineError {
    /// The object key the failure belongs to.
    pub fn key(&self) -> &str {
        match self {
            PipelineError::Presign { key, .. }
            | PipelineError::Generate { key, .. }
            | PipelineError::Record { key, .. }
            | PipelineError::Write { key, .. } => key,
        }
    }
}

/// Convenience type alias for tagger results.
pub type Result<T> = std::result::Result<T, TaggerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_var_names_the_variable() {
        let err = ConfigError::MissingVar("S3_BUCKET");
        assert!(err.to_string().contains("S3_BUCKET"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(TaggerError::from(ConfigError::MissingVar("S3_AK")).is_fatal());
        assert!(TaggerError::from(ModelError::Load {
            model: "m".into(),
            message: "gone".into(),
        })
        .is_fatal());
        assert!(TaggerError::from(StorageError::List {
            bucket: "b".into(),
            prefix: "p/".into(),
            message: "denied".into(),
        })
        .is_fatal());

        let item = PipelineError::Generate {
            key: "a/b.png".into(),
            source: ModelError::NotLoaded,
        };
        assert!(!TaggerError::from(item).is_fatal());
    }

    #[test]
    fn test_pipeline_error_carries_key() {
        let err = PipelineError::Record {
            key: "dir/.hidden".into(),
            source: RecordError::InvalidKey("dir/.hidden".into()),
        };
        assert_eq!(err.key(), "dir/.hidden");
        assert!(err.to_string().starts_with("dir/.hidden:"));
    }
}
