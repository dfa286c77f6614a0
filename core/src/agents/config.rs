//! Start-up configuration for the edge service.
//!
//! Credentials are read once when the process starts and handed to the
//! orchestrator as plain values; nothing downstream touches the environment.

use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;

use super::providers::{ProviderKind, ProviderSeed, DEFAULT_FALLBACK_ORDER, PROVIDER_SEEDS};

pub const DEFAULT_MAX_MESSAGES: usize = 10;
pub const DEFAULT_MAX_MESSAGE_CHARS: usize = 2000;
pub const DEFAULT_VOICE_ID: &str = "EXAVITQu4vr4xnSDxMaL";
pub const DEFAULT_SPEECH_MODEL: &str = "eleven_multilingual_v2";
pub const DEFAULT_SPEECH_BASE_URL: &str = "https://api.elevenlabs.io";
pub const DEFAULT_MAX_SPEECH_CHARS: usize = 1000;

/// A provider that has a credential and can be called.
#[derive(Clone, Serialize)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    pub base_url: String,
    pub model: String,
    pub review_model: String,
    #[serde(skip)]
    pub api_key: String,
}

impl ProviderSettings {
    pub fn from_seed(seed: &ProviderSeed, api_key: impl Into<String>) -> Self {
        Self {
            kind: seed.kind,
            base_url: seed.base_url.to_string(),
            model: seed.default_model.to_string(),
            review_model: seed.review_model.to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("kind", &self.kind)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("review_model", &self.review_model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Caps applied to every conversation before it reaches a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistoryLimits {
    pub max_messages: usize,
    pub max_message_chars: usize,
}

impl Default for HistoryLimits {
    fn default() -> Self {
        Self {
            max_messages: DEFAULT_MAX_MESSAGES,
            max_message_chars: DEFAULT_MAX_MESSAGE_CHARS,
        }
    }
}

#[derive(Clone)]
pub struct SpeechSettings {
    pub base_url: String,
    pub api_key: String,
    pub default_voice: String,
    pub model_id: String,
    pub max_chars: usize,
}

impl SpeechSettings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_SPEECH_BASE_URL.to_string(),
            api_key: api_key.into(),
            default_voice: DEFAULT_VOICE_ID.to_string(),
            model_id: DEFAULT_SPEECH_MODEL.to_string(),
            max_chars: DEFAULT_MAX_SPEECH_CHARS,
        }
    }
}

impl fmt::Debug for SpeechSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechSettings")
            .field("base_url", &self.base_url)
            .field("default_voice", &self.default_voice)
            .field("model_id", &self.model_id)
            .field("max_chars", &self.max_chars)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct EdgeConfig {
    /// Providers with a credential, in seed order.
    pub providers: Vec<ProviderSettings>,
    pub speech: Option<SpeechSettings>,
    pub fallback_order: Vec<ProviderKind>,
    pub limits: HistoryLimits,
    /// `None` leaves the HTTP client's default in place.
    pub provider_timeout: Option<Duration>,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            speech: None,
            fallback_order: DEFAULT_FALLBACK_ORDER.to_vec(),
            limits: HistoryLimits::default(),
            provider_timeout: None,
        }
    }
}

impl EdgeConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();
        for seed in PROVIDER_SEEDS {
            let Some(api_key) = read(seed.api_key_env) else {
                continue;
            };
            let mut settings = ProviderSettings::from_seed(seed, api_key);
            if let Some(base_url) = read(seed.base_url_env) {
                settings.base_url = base_url;
            }
            if let Some(model) = read(seed.model_env) {
                settings.model = model;
            }
            config.providers.push(settings);
        }

        if let Some(api_key) = read("ELEVENLABS_API_KEY") {
            let mut speech = SpeechSettings::new(api_key);
            if let Some(base_url) = read("ELEVENLABS_BASE_URL") {
                speech.base_url = base_url;
            }
            if let Some(voice) = read("ELEVENLABS_VOICE_ID") {
                speech.default_voice = voice;
            }
            config.speech = Some(speech);
        }

        if let Some(order) = read("MENTOR_FALLBACK_ORDER") {
            config.fallback_order =
                parse_fallback_order(&order).context("MENTOR_FALLBACK_ORDER is invalid")?;
        }

        if let Some(secs) = read("MENTOR_PROVIDER_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("MENTOR_PROVIDER_TIMEOUT_SECS is not a number: {secs}"))?;
            config.provider_timeout = Some(Duration::from_secs(secs));
        }

        Ok(config)
    }

    pub fn provider(&self, kind: ProviderKind) -> Option<&ProviderSettings> {
        self.providers.iter().find(|p| p.kind == kind)
    }

    pub fn is_configured(&self, kind: ProviderKind) -> bool {
        self.provider(kind).is_some()
    }
}

/// Parse a comma separated provider list, dropping repeats.
pub fn parse_fallback_order(raw: &str) -> Result<Vec<ProviderKind>> {
    let mut seen = HashSet::new();
    let mut order = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let kind: ProviderKind = part.parse().map_err(|err: String| anyhow!(err))?;
        if seen.insert(kind) {
            order.push(kind);
        }
    }
    if order.is_empty() {
        return Err(anyhow!("fallback order must name at least one provider"));
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn only_providers_with_keys_are_configured() {
        let config = EdgeConfig::from_lookup(lookup(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("GEMINI_API_KEY", "   "),
        ]))
        .unwrap();
        assert!(config.is_configured(ProviderKind::OpenAi));
        assert!(!config.is_configured(ProviderKind::Gemini));
        assert!(!config.is_configured(ProviderKind::DeepSeek));
        assert!(config.speech.is_none());
    }

    #[test]
    fn overrides_are_applied() {
        let config = EdgeConfig::from_lookup(lookup(&[
            ("DEEPSEEK_API_KEY", "ds"),
            ("DEEPSEEK_BASE_URL", "http://127.0.0.1:9000"),
            ("DEEPSEEK_MODEL", "deepseek-reasoner"),
            ("ELEVENLABS_API_KEY", "xi"),
            ("MENTOR_FALLBACK_ORDER", "deepseek, openai, deepseek"),
            ("MENTOR_PROVIDER_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();
        let deepseek = config.provider(ProviderKind::DeepSeek).unwrap();
        assert_eq!(deepseek.base_url, "http://127.0.0.1:9000");
        assert_eq!(deepseek.model, "deepseek-reasoner");
        assert_eq!(
            config.fallback_order,
            vec![ProviderKind::DeepSeek, ProviderKind::OpenAi]
        );
        assert_eq!(config.provider_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.speech.unwrap().default_voice, DEFAULT_VOICE_ID);
    }

    #[test]
    fn rejects_unknown_fallback_provider() {
        assert!(parse_fallback_order("gemini,claude").is_err());
        assert!(parse_fallback_order(" , ").is_err());
    }

    #[test]
    fn debug_output_hides_secrets() {
        let settings = ProviderSettings::from_seed(ProviderKind::OpenAi.seed(), "sk-secret");
        assert!(!format!("{settings:?}").contains("sk-secret"));
        let speech = SpeechSettings::new("xi-secret");
        assert!(!format!("{speech:?}").contains("xi-secret"));
    }
}
