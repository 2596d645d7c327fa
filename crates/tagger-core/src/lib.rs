//! Tagger Core - batch tag-style descriptions for images in object storage.
//!
//! Lists images under a bucket prefix, hands each one to a vision-language
//! model by presigned URL, and writes one JSON record per image.
//!
//! # Architecture
//!
//! ```text
//! Config → list keys → presign → describe (VLM server) → output/<name>.json
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use tagger_core::{BatchRunner, Config, ModelChoice};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> tagger_core::Result<()> {
//!     let config = Config::from_env()?;
//!     let mut runner = BatchRunner::from_config(&config, ModelChoice::Qwen).await;
//!     let summary = runner.run().await?;
//!     println!("{} written, {} failed", summary.succeeded, summary.failed);
//!     Ok(())
//! }
//! ```

pub mod batch;
pub mod config;
pub mod describe;
pub mod error;
pub mod hub;
pub mod output;
pub mod storage;

pub use batch::{BatchEvent, BatchOptions, BatchRunner, BatchSummary, ItemOutcome};
pub use config::Config;
pub use describe::{DescriptionGenerator, ModelChoice, OpenAiCompatBackend, VisionBackend};
pub use error::{
    ConfigError, HubError, ModelError, PipelineError, RecordError, Result, StorageError,
    TaggerError,
};
pub use hub::{DownloadSummary, ModelDownloader};
pub use output::{derive_filename, OutputRecord, RecordWriter};
pub use storage::{ObjectStore, S3Store};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
