//! S3-compatible object store backed by `aws-sdk-s3`.

use super::{collect_pages, ListPage, ObjectStore};
use crate::config::StorageConfig;
use crate::error::StorageError;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use std::time::Duration;

/// S3 client bound to one bucket, using static credentials.
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    /// Build a client from the storage section of the config.
    ///
    /// Credentials, region and endpoint all come from the config, so no
    /// ambient AWS profile or instance metadata is consulted.
    pub async fn new(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            "tagger-config",
        );

        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .endpoint_url(&config.endpoint)
            .load()
            .await;

        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.force_path_style)
            .build();

        tracing::debug!(
            "S3 client for bucket {} at {} (path style: {})",
            config.bucket,
            config.endpoint,
            config.force_path_style
        );

        Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        collect_pages(|token: Option<String>| async move {
            let mut req = self.client.list_objects_v2().bucket(&self.bucket);
            if !prefix.is_empty() {
                req = req.prefix(prefix);
            }
            if let Some(t) = token {
                req = req.continuation_token(t);
            }

            let resp = req.send().await.map_err(|e| StorageError::List {
                bucket: self.bucket.clone(),
                prefix: prefix.to_string(),
                message: format!("{e:?}"),
            })?;

            let keys = resp
                .contents()
                .iter()
                .filter_map(|obj| obj.key().map(String::from))
                .collect();
            let next_token = if resp.is_truncated().unwrap_or(false) {
                resp.next_continuation_token().map(String::from)
            } else {
                None
            };

            Ok::<_, StorageError>(ListPage { keys, next_token })
        })
        .await
    }

    async fn presigned_url(
        &self,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, StorageError> {
        let presigning = PresigningConfig::expires_in(expires_in).map_err(|e| {
            StorageError::Presign {
                key: key.to_string(),
                message: e.to_string(),
            }
        })?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| StorageError::Presign {
                key: key.to_string(),
                message: format!("{e:?}"),
            })?;

        Ok(request.uri().to_string())
    }
}
