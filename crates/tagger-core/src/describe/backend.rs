//! Inference backend trait and request types.

use crate::error::ModelError;
use async_trait::async_trait;
use std::time::Duration;

/// Speaker of one prompt turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
        }
    }
}

/// One content part of a prompt turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    Text(String),
    /// Image referenced by URL; the server fetches it.
    ImageUrl(String),
}

/// A prompt turn.
#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub content: Vec<Content>,
}

impl Message {
    /// Number of images referenced by this turn.
    pub fn image_count(&self) -> usize {
        self.content
            .iter()
            .filter(|c| matches!(c, Content::ImageUrl(_)))
            .count()
    }
}

/// Generation parameters sent with every request.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub do_sample: bool,
    pub num_beams: u32,
    pub max_new_tokens: u32,
    pub no_repeat_ngram_size: u32,
    pub early_stopping: bool,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.8,
            top_p: 0.95,
            do_sample: true,
            num_beams: 5,
            max_new_tokens: 4096 * 3,
            no_repeat_ngram_size: 2,
            early_stopping: true,
        }
    }
}

/// A complete generation request.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub messages: Vec<Message>,
    pub sampling: SamplingParams,
}

impl VisionRequest {
    /// Images across all turns; the backend must return one text per image.
    pub fn image_count(&self) -> usize {
        self.messages.iter().map(Message::image_count).sum()
    }
}

/// Trait that all inference backends implement.
///
/// Uses `async_trait` because the generator holds a `Box<dyn VisionBackend>`.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Whether `model` is loaded and accepting requests.
    async fn is_serving(&self, model: &str) -> Result<bool, ModelError>;

    /// Run generation, returning the decoded text of each output sequence
    /// with the prompt already stripped.
    async fn complete(
        &self,
        model: &str,
        request: &VisionRequest,
    ) -> Result<Vec<String>, ModelError>;

    /// Per-request timeout for this backend.
    fn timeout(&self) -> Duration;
}
