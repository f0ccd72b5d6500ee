use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_TEXT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_VISION_MODEL: &str = "llama-3.2-11b-vision-preview";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 1500;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ModelParams {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
}

/// One source of configuration. Unset fields defer to the layer below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SettingsLayer {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub text_model: Option<String>,
    pub vision_model: Option<String>,
    pub model_params: Option<ModelParams>,
}

impl SettingsLayer {
    pub fn defaults() -> Self {
        Self {
            api_key: None,
            base_url: Some(DEFAULT_BASE_URL.into()),
            text_model: Some(DEFAULT_TEXT_MODEL.into()),
            vision_model: Some(DEFAULT_VISION_MODEL.into()),
            model_params: Some(ModelParams {
                temperature: Some(DEFAULT_TEMPERATURE),
                max_tokens: Some(DEFAULT_MAX_TOKENS),
                top_p: None,
            }),
        }
    }

    /// Reads the credential and model overrides once, at startup.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok();
        Self {
            api_key: var("GROQ_API_KEY"),
            base_url: var("GROQ_BASE_URL"),
            text_model: var("TUTOR_TEXT_MODEL"),
            vision_model: var("TUTOR_VISION_MODEL"),
            model_params: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EffectiveSettings {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub text_model: String,
    pub vision_model: String,
    pub model_params: ModelParams,
}

impl EffectiveSettings {
    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for EffectiveSettings {
    fn default() -> Self {
        resolve_effective_settings(&SettingsLayer::defaults(), &SettingsLayer::default(), &SettingsLayer::default())
    }
}

fn non_blank(s: &Option<String>) -> Option<String> {
    s.as_deref().map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Field-by-field precedence: overrides, then environment, then defaults.
pub fn resolve_effective_settings(
    defaults: &SettingsLayer,
    env: &SettingsLayer,
    overrides: &SettingsLayer,
) -> EffectiveSettings {
    let pick = |f: fn(&SettingsLayer) -> &Option<String>| {
        non_blank(f(overrides))
            .or_else(|| non_blank(f(env)))
            .or_else(|| non_blank(f(defaults)))
    };

    let api_key = pick(|l| &l.api_key);
    let base_url = pick(|l| &l.base_url).unwrap_or_else(|| DEFAULT_BASE_URL.into());
    let text_model = pick(|l| &l.text_model).unwrap_or_else(|| DEFAULT_TEXT_MODEL.into());
    let vision_model = pick(|l| &l.vision_model).unwrap_or_else(|| DEFAULT_VISION_MODEL.into());

    let model_params = ModelParams {
        temperature: overrides
            .model_params
            .as_ref()
            .and_then(|p| p.temperature)
            .or_else(|| env.model_params.as_ref().and_then(|p| p.temperature))
            .or_else(|| defaults.model_params.as_ref().and_then(|p| p.temperature)),
        max_tokens: overrides
            .model_params
            .as_ref()
            .and_then(|p| p.max_tokens)
            .or_else(|| env.model_params.as_ref().and_then(|p| p.max_tokens))
            .or_else(|| defaults.model_params.as_ref().and_then(|p| p.max_tokens)),
        top_p: overrides
            .model_params
            .as_ref()
            .and_then(|p| p.top_p)
            .or_else(|| env.model_params.as_ref().and_then(|p| p.top_p))
            .or_else(|| defaults.model_params.as_ref().and_then(|p| p.top_p)),
    };

    EffectiveSettings {
        api_key,
        base_url,
        text_model,
        vision_model,
        model_params,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precedence_overrides_over_env_over_defaults() {
        let defaults = SettingsLayer::defaults();

        let env = SettingsLayer {
            api_key: Some("  gsk_env  ".into()),
            base_url: Some("http://localhost:9000/v1".into()),
            text_model: Some("env-text".into()),
            vision_model: None,
            model_params: Some(ModelParams {
                temperature: Some(0.2),
                max_tokens: None,
                top_p: None,
            }),
        };

        let overrides = SettingsLayer {
            api_key: None,
            base_url: None,
            text_model: Some("cli-text".into()),
            vision_model: None,
            model_params: Some(ModelParams {
                temperature: None,
                max_tokens: Some(400),
                top_p: Some(0.5),
            }),
        };

        let eff = resolve_effective_settings(&defaults, &env, &overrides);

        assert_eq!(eff.api_key.as_deref(), Some("gsk_env")); // trimmed, from env
        assert_eq!(eff.base_url, "http://localhost:9000/v1");
        assert_eq!(eff.text_model, "cli-text");
        assert_eq!(eff.vision_model, DEFAULT_VISION_MODEL);
        assert_eq!(eff.model_params.temperature, Some(0.2)); // from env
        assert_eq!(eff.model_params.max_tokens, Some(400)); // from overrides
        assert_eq!(eff.model_params.top_p, Some(0.5)); // from overrides
    }

    #[test]
    fn blank_credential_counts_as_missing() {
        let env = SettingsLayer { api_key: Some("   ".into()), ..Default::default() };
        let eff = resolve_effective_settings(&SettingsLayer::defaults(), &env, &SettingsLayer::default());
        assert!(!eff.has_credential());
        assert_eq!(eff.model_params.temperature, Some(DEFAULT_TEMPERATURE));
        assert_eq!(eff.model_params.max_tokens, Some(DEFAULT_MAX_TOKENS));
    }

    #[test]
    fn credential_never_serialized() {
        let eff = EffectiveSettings { api_key: Some("secret".into()), ..Default::default() };
        let json = serde_json::to_string(&eff).unwrap();
        assert!(!json.contains("secret"));
    }
}
