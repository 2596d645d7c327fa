//! Model repository download from a Hugging Face compatible hub.
//!
//! Every file of the repository is materialized under the destination
//! directory as a regular file: no symlinks, no blob cache. Files already on
//! disk with the size the hub reports are skipped, so an interrupted download
//! resumes by running it again.

use crate::config::HubConfig;
use crate::error::HubError;
use futures_util::StreamExt;
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// One file listed in a repository.
#[derive(Debug, Clone, Deserialize)]
pub struct RepoFile {
    /// Path relative to the repository root
    pub rfilename: String,
    /// Size in bytes, when the hub reports it
    #[serde(default)]
    pub size: Option<u64>,
}

#[derive(Deserialize)]
struct RepoInfo {
    #[serde(default)]
    siblings: Vec<RepoFile>,
}

/// What a download run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    /// Files fetched from the hub
    pub downloaded: usize,
    /// Files already present with the expected size
    pub skipped: usize,
    /// Bytes written
    pub bytes: u64,
}

/// Downloads whole model repositories.
pub struct ModelDownloader {
    client: reqwest::Client,
    endpoint: String,
    revision: String,
    token: Option<String>,
}

impl ModelDownloader {
    pub fn new(config: &HubConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            revision: config.revision.clone(),
            token: config.token.clone(),
        }
    }

    /// Fetch every file of `repo_id` into `destination`.
    pub async fn download(
        &self,
        repo_id: &str,
        destination: &Path,
    ) -> Result<DownloadSummary, HubError> {
        tracing::info!("Downloading {} ({})", repo_id, self.revision);
        tracing::info!("  Destination: {:?}", destination);

        let files = self.list_files(repo_id).await?;
        tracing::info!("  {} file(s) in repository", files.len());

        tokio::fs::create_dir_all(destination)
            .await
            .map_err(|source| HubError::Write {
                path: destination.to_path_buf(),
                source,
            })?;

        let mut summary = DownloadSummary::default();
        for file in &files {
            let dest = safe_join(destination, &file.rfilename)?;

            if let (Some(expected), Ok(meta)) = (file.size, std::fs::metadata(&dest)) {
                if meta.is_file() && meta.len() == expected {
                    tracing::debug!("  {} already present, skipping", file.rfilename);
                    summary.skipped += 1;
                    continue;
                }
            }

            let url = self.resolve_url(repo_id, &file.rfilename);
            tracing::info!("  Fetching {}", file.rfilename);
            let written = self.fetch_file(&url, &dest, file.size).await?;

            summary.downloaded += 1;
            summary.bytes += written;
        }

        tracing::info!(
            "Download complete: {} fetched, {} skipped ({:.1} MB)",
            summary.downloaded,
            summary.skipped,
            summary.bytes as f64 / (1024.0 * 1024.0)
        );
        Ok(summary)
    }

    /// List the files of a repository at the configured revision.
    pub async fn list_files(&self, repo_id: &str) -> Result<Vec<RepoFile>, HubError> {
        let url = self.info_url(repo_id);
        let resp = self
            .authorized(self.client.get(&url))
            .send()
            .await
            .map_err(|e| request_error(&url, e))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(HubError::Request {
                url,
                message: format!("HTTP {status}: {text}"),
                status_code: Some(status.as_u16()),
            });
        }

        let info: RepoInfo = resp.json().await.map_err(|e| request_error(&url, e))?;
        Ok(info.siblings)
    }

    fn info_url(&self, repo_id: &str) -> String {
        format!(
            "{}/api/models/{}/revision/{}?blobs=true",
            self.endpoint, repo_id, self.revision
        )
    }

    fn resolve_url(&self, repo_id: &str, rfilename: &str) -> String {
        format!(
            "{}/{}/resolve/{}/{}",
            self.endpoint, repo_id, self.revision, rfilename
        )
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Stream one file to disk through a `.part` sibling, renamed on success.
    ///
    /// When `expected_size` is known, a body of any other length is discarded.
    async fn fetch_file(
        &self,
        url: &str,
        dest: &Path,
        expected_size: Option<u64>,
    ) -> Result<u64, HubError> {
        let response = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(|e| request_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HubError::Request {
                url: url.to_string(),
                message: format!("HTTP {status}"),
                status_code: Some(status.as_u16()),
            });
        }

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| write_error(parent, source))?;
        }

        let partial = part_path(dest);
        let mut file = tokio::fs::File::create(&partial)
            .await
            .map_err(|source| write_error(&partial, source))?;

        let total_size = response.content_length();
        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| request_error(url, e))?;
            file.write_all(&chunk)
                .await
                .map_err(|source| write_error(&partial, source))?;
            downloaded += chunk.len() as u64;

            if let Some(total) = total_size {
                if downloaded % (500 * 1024 * 1024) < chunk.len() as u64 {
                    tracing::info!(
                        "    Progress: {:.0}%",
                        downloaded as f64 / total as f64 * 100.0
                    );
                }
            }
        }

        file.flush()
            .await
            .map_err(|source| write_error(&partial, source))?;
        drop(file);

        if let Some(expected) = expected_size {
            if downloaded != expected {
                let _ = tokio::fs::remove_file(&partial).await;
                return Err(HubError::Request {
                    url: url.to_string(),
                    message: format!("incomplete body: {downloaded} of {expected} bytes"),
                    status_code: None,
                });
            }
        }

        tokio::fs::rename(&partial, dest)
            .await
            .map_err(|source| write_error(dest, source))?;

        Ok(downloaded)
    }
}

/// Join a hub-provided relative path onto `root`, refusing anything that
/// could land outside it.
pub fn safe_join(root: &Path, rfilename: &str) -> Result<PathBuf, HubError> {
    let relative = Path::new(rfilename);
    let is_plain = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if rfilename.is_empty() || !is_plain {
        return Err(HubError::UnsafePath(rfilename.to_string()));
    }
    Ok(root.join(relative))
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    dest.with_file_name(name)
}

fn request_error(url: &str, e: reqwest::Error) -> HubError {
    HubError::Request {
        url: url.to_string(),
        message: e.to_string(),
        status_code: e.status().map(|s| s.as_u16()),
    }
}

fn write_error(path: &Path, source: std::io::Error) -> HubError {
    HubError::Write {
        path: path.to_path_buf(),
        source,
    }
}
