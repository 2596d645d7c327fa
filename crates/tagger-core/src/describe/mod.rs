//! Tag-style image descriptions from a vision-language model.
//!
//! [`DescriptionGenerator`] owns the prompt and sampling parameters and
//! delegates inference to a [`VisionBackend`]. It starts unloaded; `load()`
//! checks that the model is materialized locally and being served, after
//! which `generate()` may be called for the rest of the process.

mod backend;
mod openai;

#[cfg(test)]
pub(crate) mod scripted;

pub use backend::{Content, Message, Role, SamplingParams, VisionBackend, VisionRequest};
pub use openai::OpenAiCompatBackend;

use crate::config::Config;
use crate::error::ModelError;
use std::path::{Path, PathBuf};

/// System instruction asking for comma-separated search tags.
pub const SYSTEM_PROMPT: &str = "The following is a image, try to use tags to describe it for text-based search engine.

Your description should include key elements such as color, objects, actions, people, settings, atmosphere, etc.

Each tags as short as possible.

Think step by step and output the tags separated by commas at the end.

Example:

It's a beautiful spring day with cherry blossoms gently floating in the air.
A girl wearing a white dress is sitting on the grass, holding a bottle of drink and enjoying the sunshine.
In the background, many children are playing on the open grassland.

tags: spring, park, grass, cherry blossom, drink, children, outdoor, girl, green, white dress
";

/// Which locally downloaded model to describe images with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ModelChoice {
    /// Qwen2.5-VL instruct model
    #[default]
    Qwen,
    /// QVQ visual reasoning model
    Qvq,
}

impl ModelChoice {
    /// Local directory of the chosen model.
    pub fn model_path<'a>(&self, config: &'a Config) -> &'a Path {
        match self {
            ModelChoice::Qwen => &config.model.qwen_model_path,
            ModelChoice::Qvq => &config.model.qvq_model_path,
        }
    }
}

/// Lifecycle of a generator. There is no way back to `Unloaded`.
#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Unloaded,
    Loaded,
}

/// Build the two-turn prompt for one image.
pub fn build_messages(image_url: &str) -> Vec<Message> {
    vec![
        Message {
            role: Role::System,
            content: vec![Content::Text(SYSTEM_PROMPT.to_string())],
        },
        Message {
            role: Role::User,
            content: vec![Content::ImageUrl(image_url.to_string())],
        },
    ]
}

/// Generates tag-style descriptions for images referenced by URL.
pub struct DescriptionGenerator {
    model_path: PathBuf,
    served_model: String,
    backend: Box<dyn VisionBackend>,
    sampling: SamplingParams,
    state: State,
}

impl DescriptionGenerator {
    /// Create an unloaded generator.
    ///
    /// `served_model` is the name the backend knows the model by; when
    /// `None` the model path is used, which is what vLLM reports by default.
    pub fn new(
        model_path: impl Into<PathBuf>,
        served_model: Option<String>,
        backend: Box<dyn VisionBackend>,
        sampling: SamplingParams,
    ) -> Self {
        let model_path = model_path.into();
        let served_model =
            served_model.unwrap_or_else(|| model_path.to_string_lossy().into_owned());
        Self {
            model_path,
            served_model,
            backend,
            sampling,
            state: State::Unloaded,
        }
    }

    /// Create an unloaded generator talking to the configured inference server.
    pub fn from_config(config: &Config, choice: ModelChoice) -> Self {
        let sampling = SamplingParams {
            max_new_tokens: config.vlm.max_new_tokens,
            ..SamplingParams::default()
        };
        Self::new(
            choice.model_path(config),
            config.vlm.served_model.clone(),
            Box::new(OpenAiCompatBackend::new(&config.vlm)),
            sampling,
        )
    }

    pub fn is_loaded(&self) -> bool {
        self.state == State::Loaded
    }

    pub fn served_model(&self) -> &str {
        &self.served_model
    }

    /// Make the model ready for generation.
    ///
    /// Fails if the local model directory lacks `config.json` or the backend
    /// is not serving the model. Loading an already loaded generator is a
    /// no-op.
    pub async fn load(&mut self) -> Result<(), ModelError> {
        if self.is_loaded() {
            return Ok(());
        }

        tracing::info!("Loading model and processor");
        tracing::info!("model: {}", self.model_path.display());

        if !self.model_path.join("config.json").is_file() {
            return Err(ModelError::Load {
                model: self.model_path.display().to_string(),
                message: "no config.json in model directory; run `tagger download` first"
                    .to_string(),
            });
        }

        let serving = self
            .backend
            .is_serving(&self.served_model)
            .await
            .map_err(|e| ModelError::Load {
                model: self.served_model.clone(),
                message: e.to_string(),
            })?;
        if !serving {
            return Err(ModelError::Load {
                model: self.served_model.clone(),
                message: format!("not served by the {} backend", self.backend.name()),
            });
        }

        self.state = State::Loaded;
        tracing::info!("Model and processor loaded successfully");
        Ok(())
    }

    /// Describe the image at `image_url`.
    ///
    /// Returns one text per input image, which for this single-image prompt
    /// means exactly one element.
    pub async fn generate(&self, image_url: &str) -> Result<Vec<String>, ModelError> {
        if !self.is_loaded() {
            return Err(ModelError::NotLoaded);
        }

        tracing::info!("Start generating descriptions for images");
        tracing::info!("url: {}", image_url);

        let request = VisionRequest {
            messages: build_messages(image_url),
            sampling: self.sampling.clone(),
        };
        let expected = request.image_count();
        tracing::debug!("Prompt built ({} turn(s), {} image(s))", request.messages.len(), expected);

        let outputs = self.backend.complete(&self.served_model, &request).await?;
        tracing::debug!("Generation finished with {} output(s)", outputs.len());

        if outputs.len() != expected {
            return Err(ModelError::UnexpectedOutputCount {
                expected,
                actual: outputs.len(),
            });
        }

        for item in &outputs {
            tracing::info!("{}", item);
        }
        Ok(outputs)
    }
}
