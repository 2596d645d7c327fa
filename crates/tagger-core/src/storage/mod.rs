//! Object storage access: prefix listing and presigned GET URLs.
//!
//! The [`ObjectStore`] trait is the seam the batch runner talks to; [`S3Store`]
//! is the production implementation over any S3-compatible endpoint.

mod pager;
mod s3;

#[cfg(test)]
pub(crate) mod memory;

pub use pager::{collect_pages, ListPage};
pub use s3::S3Store;

use crate::error::StorageError;
use async_trait::async_trait;
use std::time::Duration;

/// Trait that all object stores implement.
///
/// Uses `async_trait` so the runner can hold a `Box<dyn ObjectStore>`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Bucket name, for logging.
    fn bucket(&self) -> &str;

    /// Every key starting with `prefix`, in listing order.
    ///
    /// Directory placeholder keys (trailing `/`) are included. An unmatched
    /// prefix yields an empty list, not an error.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// A GET-capable URL for `key`, valid for `expires_in`.
    async fn presigned_url(&self, key: &str, expires_in: Duration)
        -> Result<String, StorageError>;
}
