use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Chat-completion backends the edge service knows how to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Gemini,
    DeepSeek,
}

/// Wire dialect spoken by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    /// `choices[0].message.content` style chat completions with bearer auth.
    OpenAiChat,
    /// `generateContent` with the key passed as a query parameter.
    GeminiGenerate,
}

/// Static description of a provider, used to seed [`super::config::ProviderSettings`].
#[derive(Debug, Clone, Copy)]
pub struct ProviderSeed {
    pub kind: ProviderKind,
    pub display: &'static str,
    pub wire: WireFormat,
    pub base_url: &'static str,
    pub chat_path: &'static str,
    pub default_model: &'static str,
    pub review_model: &'static str,
    pub api_key_env: &'static str,
    pub base_url_env: &'static str,
    pub model_env: &'static str,
}

pub const PROVIDER_SEEDS: &[ProviderSeed] = &[
    ProviderSeed {
        kind: ProviderKind::Gemini,
        display: "Gemini",
        wire: WireFormat::GeminiGenerate,
        base_url: "https://generativelanguage.googleapis.com/v1beta",
        chat_path: "/models",
        default_model: "gemini-1.5-pro",
        review_model: "gemini-1.5-flash",
        api_key_env: "GEMINI_API_KEY",
        base_url_env: "GEMINI_BASE_URL",
        model_env: "GEMINI_MODEL",
    },
    ProviderSeed {
        kind: ProviderKind::OpenAi,
        display: "OpenAI",
        wire: WireFormat::OpenAiChat,
        base_url: "https://api.openai.com",
        chat_path: "/v1/chat/completions",
        default_model: "gpt-4o-mini",
        review_model: "gpt-4o-mini",
        api_key_env: "OPENAI_API_KEY",
        base_url_env: "OPENAI_BASE_URL",
        model_env: "OPENAI_MODEL",
    },
    ProviderSeed {
        kind: ProviderKind::DeepSeek,
        display: "DeepSeek",
        wire: WireFormat::OpenAiChat,
        base_url: "https://api.deepseek.com",
        chat_path: "/chat/completions",
        default_model: "deepseek-chat",
        review_model: "deepseek-chat",
        api_key_env: "DEEPSEEK_API_KEY",
        base_url_env: "DEEPSEEK_BASE_URL",
        model_env: "DEEPSEEK_MODEL",
    },
];

/// Order used to fill in fallback candidates after a persona's preferred provider.
pub const DEFAULT_FALLBACK_ORDER: [ProviderKind; 3] =
    [ProviderKind::Gemini, ProviderKind::OpenAi, ProviderKind::DeepSeek];

impl ProviderKind {
    pub fn seed(self) -> &'static ProviderSeed {
        PROVIDER_SEEDS
            .iter()
            .find(|seed| seed.kind == self)
            .unwrap_or(&PROVIDER_SEEDS[0])
    }

    pub fn display_name(self) -> &'static str {
        self.seed().display
    }

    pub fn id(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
            Self::DeepSeek => "deepseek",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "gemini" | "google" => Ok(Self::Gemini),
            "deepseek" => Ok(Self::DeepSeek),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_has_exactly_one_seed() {
        for kind in DEFAULT_FALLBACK_ORDER {
            assert_eq!(
                PROVIDER_SEEDS.iter().filter(|s| s.kind == kind).count(),
                1,
                "{kind}"
            );
            assert_eq!(kind.seed().kind, kind);
        }
    }

    #[test]
    fn parses_ids_case_insensitively() {
        assert_eq!("OpenAI".parse::<ProviderKind>(), Ok(ProviderKind::OpenAi));
        assert_eq!(" deepseek ".parse::<ProviderKind>(), Ok(ProviderKind::DeepSeek));
        assert_eq!("google".parse::<ProviderKind>(), Ok(ProviderKind::Gemini));
        assert!("anthropic".parse::<ProviderKind>().is_err());
    }
}
