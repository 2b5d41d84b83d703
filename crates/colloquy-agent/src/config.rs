use colloquy_core::{ColloquyError, ColloquyResult, Provider};
use serde::{Deserialize, Deserializer, Serialize};

/// Connection settings for one provider backend.
#[derive(Debug, Clone, Serialize)]
pub struct ModelConfig {
    pub model_id: String,
    /// Inline API key. When unset the key is read from `api_key_env` on every
    /// request, so a key added to the environment later is picked up.
    pub api_key: Option<String>,
    pub api_key_env: String,
    pub api_base_url: Option<String>,
    pub max_tokens: u32,
}

fn default_max_tokens() -> u32 {
    1024
}

impl ModelConfig {
    /// Defaults for the OpenAI backend.
    pub fn openai() -> Self {
        Self {
            model_id: "gpt-4o".to_string(),
            api_key: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_base_url: None,
            max_tokens: default_max_tokens(),
        }
    }

    /// Defaults for the Anthropic backend.
    pub fn anthropic() -> Self {
        Self {
            model_id: "claude-sonnet-4-20250514".to_string(),
            api_key: None,
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            api_base_url: None,
            max_tokens: default_max_tokens(),
        }
    }

    pub fn base_url(&self, provider: Provider) -> &str {
        if let Some(url) = &self.api_base_url {
            url
        } else {
            match provider {
                Provider::OpenAi => "https://api.openai.com",
                Provider::Anthropic => "https://api.anthropic.com",
            }
        }
    }

    /// Resolve the API key, failing with `ProviderUnavailable` when neither
    /// the inline key nor the environment variable is set.
    pub fn resolve_api_key(&self) -> ColloquyResult<String> {
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) {
            return Ok(key.to_string());
        }
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.is_empty() => Ok(key),
            _ => Err(ColloquyError::ProviderUnavailable(format!(
                "{} is not set. Please add it to .env.",
                self.api_key_env
            ))),
        }
    }
}

/// Settings for every provider, keyed by the `[providers.*]` tables.
///
/// Every key in a table is optional; missing keys keep the provider's
/// defaults from [`ModelConfig::openai`] and [`ModelConfig::anthropic`].
#[derive(Debug, Clone, Serialize)]
pub struct ProvidersConfig {
    pub openai: ModelConfig,
    pub anthropic: ModelConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai: ModelConfig::openai(),
            anthropic: ModelConfig::anthropic(),
        }
    }
}

/// One `[providers.*]` table as written in the file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ModelTable {
    model_id: Option<String>,
    api_key: Option<String>,
    api_key_env: Option<String>,
    api_base_url: Option<String>,
    max_tokens: Option<u32>,
}

impl ModelTable {
    fn apply(self, mut base: ModelConfig) -> ModelConfig {
        if let Some(model_id) = self.model_id {
            base.model_id = model_id;
        }
        if self.api_key.is_some() {
            base.api_key = self.api_key;
        }
        if let Some(env) = self.api_key_env {
            base.api_key_env = env;
        }
        if self.api_base_url.is_some() {
            base.api_base_url = self.api_base_url;
        }
        if let Some(max) = self.max_tokens {
            base.max_tokens = max;
        }
        base
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProvidersTables {
    openai: ModelTable,
    anthropic: ModelTable,
}

impl<'de> Deserialize<'de> for ProvidersConfig {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tables = ProvidersTables::deserialize(deserializer)?;
        Ok(Self {
            openai: tables.openai.apply(ModelConfig::openai()),
            anthropic: tables.anthropic.apply(ModelConfig::anthropic()),
        })
    }
}

impl ProvidersConfig {
    /// Apply `OPENAI_MODEL`, `ANTHROPIC_MODEL` and `MAX_TOKENS` from the
    /// environment on top of file values.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(model) = lookup("OPENAI_MODEL").filter(|m| !m.is_empty()) {
            self.openai.model_id = model;
        }
        if let Some(model) = lookup("ANTHROPIC_MODEL").filter(|m| !m.is_empty()) {
            self.anthropic.model_id = model;
        }
        if let Some(max) = lookup("MAX_TOKENS").and_then(|v| v.parse::<u32>().ok()) {
            self.openai.max_tokens = max;
            self.anthropic.max_tokens = max;
        }
    }
}
