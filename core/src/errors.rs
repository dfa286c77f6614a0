use thiserror::Error;

use crate::agents::ProviderKind;

/// Request level failures surfaced by the orchestrator and the HTTP layer.
#[derive(Debug, Error)]
pub enum MentorError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("unknown persona: {0}")]
    PersonaNotFound(String),
    #[error("no AI provider available")]
    NoProviderAvailable,
    #[error("speech synthesis unavailable: {0}")]
    SpeechUnavailable(String),
}

impl MentorError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "REQ-1001",
            Self::PersonaNotFound(_) => "PER-1001",
            Self::NoProviderAvailable => "AI-1000",
            Self::SpeechUnavailable(_) => "TTS-1000",
        }
    }

    pub fn explain(&self) -> &'static str {
        match self {
            Self::Validation(_) => "The request body did not have the expected shape.",
            Self::PersonaNotFound(_) => "No persona is registered for the requested id.",
            Self::NoProviderAvailable => {
                "Every configured chat provider failed, or none has a credential."
            }
            Self::SpeechUnavailable(_) => {
                "The speech provider is not configured or rejected the request."
            }
        }
    }
}

/// A single provider call failed. Never shown to clients; it only moves the
/// orchestrator on to the next candidate.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: ProviderKind,
        status: u16,
        body: String,
    },
    #[error("{provider} request failed: {source}")]
    Transport {
        provider: ProviderKind,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} response was missing {field}")]
    MalformedResponse {
        provider: ProviderKind,
        field: &'static str,
    },
}

impl ProviderError {
    pub fn provider(&self) -> ProviderKind {
        match self {
            Self::Status { provider, .. }
            | Self::Transport { provider, .. }
            | Self::MalformedResponse { provider, .. } => *provider,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Status { .. } => "AI-2001",
            Self::Transport { .. } => "AI-2002",
            Self::MalformedResponse { .. } => "AI-2003",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct_per_variant() {
        let errors = [
            MentorError::Validation("x".into()),
            MentorError::PersonaNotFound("x".into()),
            MentorError::NoProviderAvailable,
            MentorError::SpeechUnavailable("x".into()),
        ];
        let mut codes: Vec<_> = errors.iter().map(|e| e.code()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn provider_error_reports_its_provider() {
        let err = ProviderError::MalformedResponse {
            provider: ProviderKind::Gemini,
            field: "candidates[0].content.parts[0].text",
        };
        assert_eq!(err.provider(), ProviderKind::Gemini);
        assert!(err.to_string().starts_with("Gemini"));
    }
}
