//! OpenAI-compatible backend (vLLM, SGLang, LMDeploy, ...).
//!
//! Images are passed by URL in the user turn; the server downloads them.
//! Beam search and n-gram blocking are not part of the OpenAI schema, so they
//! travel as extra top-level fields, which these servers accept.

use super::backend::{Content, Message, VisionBackend, VisionRequest};
use crate::config::VlmConfig;
use crate::error::ModelError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backend talking to `/models` and `/chat/completions` under a base URL.
pub struct OpenAiCompatBackend {
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenAiCompatBackend {
    pub fn new(config: &VlmConfig) -> Self {
        Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            client: reqwest::Client::new(),
        }
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        }
    }
}

// --- Request types ---

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    n: usize,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    // Extensions understood by self-hosted servers
    do_sample: bool,
    num_beams: u32,
    use_beam_search: bool,
    no_repeat_ngram_size: u32,
    early_stopping: bool,
    skip_special_tokens: bool,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Vec<ChatContent>,
}

#[derive(Serialize)]
#[serde(tag = "type")]
enum ChatContent {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

impl From<&Message> for ChatMessage {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role.as_str(),
            content: message
                .content
                .iter()
                .map(|part| match part {
                    Content::Text(text) => ChatContent::Text { text: text.clone() },
                    Content::ImageUrl(url) => ChatContent::ImageUrl {
                        image_url: ImageUrl { url: url.clone() },
                    },
                })
                .collect(),
        }
    }
}

fn chat_request<'a>(model: &'a str, request: &VisionRequest) -> ChatRequest<'a> {
    let sampling = &request.sampling;
    ChatRequest {
        model,
        messages: request.messages.iter().map(ChatMessage::from).collect(),
        n: 1,
        max_tokens: sampling.max_new_tokens,
        temperature: sampling.temperature,
        top_p: sampling.top_p,
        do_sample: sampling.do_sample,
        num_beams: sampling.num_beams,
        use_beam_search: sampling.num_beams > 1,
        no_repeat_ngram_size: sampling.no_repeat_ngram_size,
        early_stopping: sampling.early_stopping,
        skip_special_tokens: true,
    }
}

// --- Response types ---

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    index: usize,
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

#[derive(Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

/// Decode choices into texts ordered by choice index, text kept as generated.
fn decode_choices(mut choices: Vec<Choice>) -> Vec<String> {
    choices.sort_by_key(|c| c.index);
    choices
        .into_iter()
        .map(|c| c.message.content.unwrap_or_default())
        .collect()
}

#[async_trait]
impl VisionBackend for OpenAiCompatBackend {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    async fn is_serving(&self, model: &str) -> Result<bool, ModelError> {
        let url = format!("{}/models", self.endpoint);
        let resp = self
            .authorized(self.client.get(&url))
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(|e| ModelError::Request {
                message: format!("GET {url} failed: {e}"),
                status_code: None,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ModelError::Request {
                message: format!("GET {url}: HTTP {status}"),
                status_code: Some(status.as_u16()),
            });
        }

        let list: ModelList = resp.json().await.map_err(|e| ModelError::Request {
            message: format!("Failed to parse model list: {e}"),
            status_code: None,
        })?;

        let served: Vec<&str> = list.data.iter().map(|m| m.id.as_str()).collect();
        tracing::debug!("Server at {} serves {:?}", self.endpoint, served);
        Ok(served.contains(&model))
    }

    async fn complete(
        &self,
        model: &str,
        request: &VisionRequest,
    ) -> Result<Vec<String>, ModelError> {
        let url = format!("{}/chat/completions", self.endpoint);
        let body = chat_request(model, request);

        let resp = self
            .authorized(self.client.post(&url))
            .json(&body)
            .timeout(self.timeout())
            .send()
            .await
            .map_err(|e| ModelError::Request {
                message: format!("Inference request failed: {e}"),
                status_code: None,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ModelError::Request {
                message: format!("HTTP {status}: {text}"),
                status_code: Some(status.as_u16()),
            });
        }

        let chat_resp: ChatResponse = resp.json().await.map_err(|e| ModelError::Request {
            message: format!("Failed to parse inference response: {e}"),
            status_code: None,
        })?;

        if let Some(usage) = &chat_resp.usage {
            tracing::debug!("Tokens used: {}", usage.total_tokens);
        }

        Ok(decode_choices(chat_resp.choices))
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }
}
