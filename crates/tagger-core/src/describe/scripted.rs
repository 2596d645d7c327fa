//! Deterministic backend for tests.

use super::backend::{Content, VisionBackend, VisionRequest};
use crate::error::ModelError;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Answers `tags: <image url>` for every image, unless told otherwise.
pub(crate) struct ScriptedBackend {
    serving: bool,
    outputs_per_call: usize,
    fail_markers: Vec<String>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedBackend {
    pub(crate) fn new() -> Self {
        Self {
            serving: true,
            outputs_per_call: 1,
            fail_markers: Vec::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn not_serving(mut self) -> Self {
        self.serving = false;
        self
    }

    pub(crate) fn with_outputs_per_call(mut self, n: usize) -> Self {
        self.outputs_per_call = n;
        self
    }

    /// Image URLs of every `complete` call, shared with the backend.
    pub(crate) fn call_log(&self) -> Arc<Mutex<Vec<String>>> {
        self.calls.clone()
    }

    /// Fail any request whose image URL contains `marker`.
    pub(crate) fn failing_on(mut self, marker: &str) -> Self {
        self.fail_markers.push(marker.to_string());
        self
    }
}

#[async_trait]
impl VisionBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn is_serving(&self, _model: &str) -> Result<bool, ModelError> {
        Ok(self.serving)
    }

    async fn complete(
        &self,
        _model: &str,
        request: &VisionRequest,
    ) -> Result<Vec<String>, ModelError> {
        let url = request
            .messages
            .iter()
            .flat_map(|m| m.content.iter())
            .find_map(|c| match c {
                Content::ImageUrl(url) => Some(url.clone()),
                Content::Text(_) => None,
            })
            .unwrap_or_default();

        self.calls.lock().unwrap().push(url.clone());

        if self.fail_markers.iter().any(|m| url.contains(m.as_str())) {
            return Err(ModelError::Request {
                message: format!("failed to fetch image {url}"),
                status_code: Some(400),
            });
        }

        Ok((0..self.outputs_per_call)
            .map(|_| format!("tags: {url}"))
            .collect())
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(1)
    }
}
