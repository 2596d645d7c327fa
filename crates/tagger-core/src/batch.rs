//! Sequential batch run: list, presign, describe, write.
//!
//! Startup steps (model load, listing, output directory) are fatal. After
//! that every key is processed independently; a failing key is logged with
//! its error and the run moves on to the next one.

use crate::config::Config;
use crate::describe::{DescriptionGenerator, ModelChoice};
use crate::error::{PipelineError, Result};
use crate::output::{OutputRecord, RecordWriter};
use crate::storage::{ObjectStore, S3Store};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// What to process and how long presigned URLs live.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Key prefix to list
    pub prefix: String,
    /// Presigned URL lifetime
    pub presign_expiry: Duration,
}

impl BatchOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            prefix: config.storage.list_prefix.clone(),
            presign_expiry: Duration::from_secs(config.storage.presign_expires_secs),
        }
    }
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub listed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Result of processing one key.
#[derive(Debug)]
pub enum ItemOutcome {
    /// Record written to this path
    Written(PathBuf),
    /// Processing failed; no record was written
    Failed(PipelineError),
}

/// Progress notifications emitted during a run.
#[derive(Debug)]
pub enum BatchEvent<'a> {
    /// Listing finished with this many keys
    Listed(usize),
    /// One key finished
    Item {
        key: &'a str,
        outcome: &'a ItemOutcome,
    },
}

/// Drives one pass over every key under the configured prefix.
pub struct BatchRunner {
    generator: DescriptionGenerator,
    store: Box<dyn ObjectStore>,
    writer: RecordWriter,
    options: BatchOptions,
}

impl BatchRunner {
    pub fn new(
        generator: DescriptionGenerator,
        store: Box<dyn ObjectStore>,
        writer: RecordWriter,
        options: BatchOptions,
    ) -> Self {
        Self {
            generator,
            store,
            writer,
            options,
        }
    }

    /// Wire up the S3 store, inference backend and output directory from config.
    pub async fn from_config(config: &Config, choice: ModelChoice) -> Self {
        Self::new(
            DescriptionGenerator::from_config(config, choice),
            Box::new(S3Store::new(&config.storage).await),
            RecordWriter::new(&config.output.dir),
            BatchOptions::from_config(config),
        )
    }

    pub async fn run(&mut self) -> Result<BatchSummary> {
        self.run_with(|_| {}).await
    }

    /// Run the batch, reporting progress through `on_event`.
    pub async fn run_with<F>(&mut self, mut on_event: F) -> Result<BatchSummary>
    where
        F: FnMut(BatchEvent<'_>),
    {
        let start = Instant::now();

        self.generator.load().await?;

        let keys = self.store.list_keys(&self.options.prefix).await?;
        tracing::info!(
            "Found {} object(s) under s3://{}/{}",
            keys.len(),
            self.store.bucket(),
            self.options.prefix
        );
        on_event(BatchEvent::Listed(keys.len()));

        self.writer.ensure_dir()?;

        let mut summary = BatchSummary {
            listed: keys.len(),
            ..BatchSummary::default()
        };

        for key in &keys {
            let outcome = match self.process_key(key).await {
                Ok(path) => {
                    summary.succeeded += 1;
                    tracing::debug!("Wrote {:?}", path);
                    ItemOutcome::Written(path)
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!("Error processing {}: {}", key, e);
                    ItemOutcome::Failed(e)
                }
            };
            on_event(BatchEvent::Item {
                key,
                outcome: &outcome,
            });
        }

        tracing::info!(
            "Batch finished in {:.1}s: {} succeeded, {} failed, {} listed",
            start.elapsed().as_secs_f64(),
            summary.succeeded,
            summary.failed,
            summary.listed
        );
        Ok(summary)
    }

    /// Presign, describe and persist a single key.
    async fn process_key(&self, key: &str) -> std::result::Result<PathBuf, PipelineError> {
        let url = self
            .store
            .presigned_url(key, self.options.presign_expiry)
            .await
            .map_err(|source| PipelineError::Presign {
                key: key.to_string(),
                source,
            })?;

        let description =
            self.generator
                .generate(&url)
                .await
                .map_err(|source| PipelineError::Generate {
                    key: key.to_string(),
                    source,
                })?;

        let record =
            OutputRecord::new(key, description).map_err(|source| PipelineError::Record {
                key: key.to_string(),
                source,
            })?;

        self.writer
            .write(&record)
            .map_err(|e| PipelineError::Write {
                key: key.to_string(),
                path: self.writer.path_for(&record.filename),
                message: e.to_string(),
            })
    }
}
