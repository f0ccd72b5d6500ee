use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::settings::EffectiveSettings;

#[derive(Debug, Clone, Serialize, Default)]
pub struct ModelRequest {
    pub model: String,
    pub messages: Vec<serde_json::Value>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelResponse {
    /// `None` when the endpoint answered without any text.
    pub content: Option<String>,
    pub model: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("model call failed: {status}: {body}")]
    Status { status: reqwest::StatusCode, body: String },
    #[error("malformed response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn generate(&self, req: ModelRequest) -> Result<ModelResponse, ModelError>;
}

/// Any endpoint speaking the OpenAI chat-completions dialect (Groq included).
#[derive(Clone)]
pub struct OpenAICompatible {
    pub base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAICompatible {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// `None` when there is no credential to talk to the endpoint with.
    pub fn from_settings(settings: &EffectiveSettings) -> Option<Self> {
        let key = settings.api_key.as_deref()?;
        Some(Self::new(settings.base_url.clone(), key))
    }
}

#[derive(Debug, Serialize)]
struct OaiChatRequest<'a> {
    model: &'a str,
    messages: &'a [serde_json::Value],
    #[serde(skip_serializing_if = "Option::is_none")] temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")] max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")] top_p: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct OaiChatResponse {
    choices: Vec<OaiChoice>,
    #[serde(default)]
    model: String,
}

#[derive(Debug, Deserialize)]
struct OaiChoice { message: OaiMessage }

#[derive(Debug, Deserialize)]
struct OaiMessage { content: Option<String> }

#[async_trait]
impl ChatModel for OpenAICompatible {
    async fn generate(&self, req: ModelRequest) -> Result<ModelResponse, ModelError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let body = OaiChatRequest {
            model: &req.model,
            messages: &req.messages,
            temperature: req.temperature,
            max_tokens: req.max_tokens,
            top_p: req.top_p,
        };
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ModelError::Status { status, body });
        }
        let v: OaiChatResponse = resp
            .json()
            .await
            .map_err(|e| ModelError::Malformed(e.to_string()))?;
        let choice = v
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::Malformed("no choices in response".into()))?;
        Ok(ModelResponse { content: choice.message.content, model: v.model })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModelSelector;

impl ModelSelector {
    /// Vision-capable model when an image rides along, the text model otherwise.
    pub fn select(settings: &EffectiveSettings, has_image: bool) -> &str {
        if has_image { &settings.vision_model } else { &settings.text_model }
    }
}
