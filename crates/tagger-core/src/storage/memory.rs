//! In-memory object store for tests.

use super::ObjectStore;
use crate::error::StorageError;
use async_trait::async_trait;
use std::collections::HashSet;
use std::time::Duration;

pub(crate) struct MemoryStore {
    bucket: String,
    keys: Vec<String>,
    unsignable: HashSet<String>,
    fail_listing: bool,
}

impl MemoryStore {
    pub(crate) fn new(keys: &[&str]) -> Self {
        Self {
            bucket: "memory".to_string(),
            keys: keys.iter().map(|k| k.to_string()).collect(),
            unsignable: HashSet::new(),
            fail_listing: false,
        }
    }

    /// Make presigning `key` fail.
    pub(crate) fn refuse_presign(mut self, key: &str) -> Self {
        self.unsignable.insert(key.to_string());
        self
    }

    pub(crate) fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        if self.fail_listing {
            return Err(StorageError::List {
                bucket: self.bucket.clone(),
                prefix: prefix.to_string(),
                message: "AccessDenied".to_string(),
            });
        }
        Ok(self
            .keys
            .iter()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn presigned_url(
        &self,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError> {
        if self.unsignable.contains(key) {
            return Err(StorageError::Presign {
                key: key.to_string(),
                message: "SignatureDoesNotMatch".to_string(),
            });
        }
        Ok(format!(
            "https://{}.example.com/{}?X-Amz-Expires={}",
            self.bucket,
            key,
            expires_in.as_secs()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_prefix_listing_semantics() {
        let store =
            MemoryStore::new(&["charts/", "charts/a.png", "charts/b.png", "photos/c.jpg"]);

        assert_eq!(store.list_keys("").await.unwrap().len(), 4);
        assert_eq!(
            store.list_keys("charts/").await.unwrap(),
            vec!["charts/", "charts/a.png", "charts/b.png"]
        );
        assert!(store.list_keys("maps/").await.unwrap().is_empty());
    }
}
