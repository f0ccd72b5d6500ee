use std::sync::Arc;

use tracing::{debug, warn};

use crate::context::CompletionRequest;
use crate::models::{ChatModel, ModelRequest, ModelSelector, OpenAICompatible};
use crate::settings::EffectiveSettings;

pub const API_KEY_MISSING: &str = "⚠️ API Key missing.";
pub const EMPTY_REPLY_FALLBACK: &str = "I couldn't generate a reply this time.";
pub const ERROR_PREFIX: &str = "Error: ";

/// What came back from one completion attempt. Every variant is valid assistant content.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Answer(String),
    Empty,
    Failed(String),
    MissingCredential,
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Answer(s) | Reply::Failed(s) => s.as_str(),
            Reply::Empty => EMPTY_REPLY_FALLBACK,
            Reply::MissingCredential => API_KEY_MISSING,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Reply::Answer(s) | Reply::Failed(s) => s,
            other => other.text().to_string(),
        }
    }
}

pub struct CompletionInvoker {
    settings: EffectiveSettings,
    model: Option<Arc<dyn ChatModel>>,
}

impl CompletionInvoker {
    pub fn new(settings: EffectiveSettings, model: Option<Arc<dyn ChatModel>>) -> Self {
        Self { settings, model }
    }

    /// Wires up the HTTP client when a credential is configured.
    pub fn from_settings(settings: EffectiveSettings) -> Self {
        let model = OpenAICompatible::from_settings(&settings).map(|c| Arc::new(c) as Arc<dyn ChatModel>);
        Self::new(settings, model)
    }

    pub fn is_ready(&self) -> bool {
        self.model.is_some()
    }

    pub fn settings(&self) -> &EffectiveSettings {
        &self.settings
    }

    /// One request/response exchange. Never returns an error: failures come back as [`Reply::Failed`].
    pub async fn invoke(&self, request: &CompletionRequest) -> Reply {
        let Some(model) = &self.model else {
            return Reply::MissingCredential;
        };

        let model_id = ModelSelector::select(&self.settings, request.has_image());
        debug!(model = model_id, history = request.history.len(), image = request.has_image(), "dispatching completion");

        let params = &self.settings.model_params;
        let req = ModelRequest {
            model: model_id.to_string(),
            messages: request.to_wire_messages(),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            top_p: params.top_p,
        };

        match model.generate(req).await {
            Ok(resp) => {
                let answer = resp.content.as_deref().map(str::trim).unwrap_or_default();
                if answer.is_empty() {
                    Reply::Empty
                } else {
                    Reply::Answer(answer.to_string())
                }
            }
            Err(e) => {
                warn!(model = model_id, error = %e, "completion failed");
                Reply::Failed(format!("{ERROR_PREFIX}{e}"))
            }
        }
    }
}
