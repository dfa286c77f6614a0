//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Bytes;
use mentor_core::agents::{ChatProvider, CompletionRequest, HistoryLimits, ModelTier, ProviderKind};
use mentor_core::api::ApiState;
use mentor_core::errors::{MentorError, ProviderError};
use mentor_core::orchestrator::Orchestrator;
use mentor_core::personas::PersonaRegistry;
use mentor_core::speech::SpeechSynthesizer;

#[derive(Debug, Clone)]
pub enum Outcome {
    Text(String),
    Fail,
}

/// Provider that answers from a script and records every request.
pub struct ScriptedProvider {
    kind: ProviderKind,
    answer: Outcome,
    review: Outcome,
    calls: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn answering(kind: ProviderKind, text: impl Into<String>) -> Arc<Self> {
        let text = text.into();
        Arc::new(Self {
            kind,
            answer: Outcome::Text(text.clone()),
            review: Outcome::Text(format!("{text} (reviewed)")),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(kind: ProviderKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            answer: Outcome::Fail,
            review: Outcome::Fail,
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Answers normally but gives `review` for refinement passes.
    pub fn reviewing(kind: ProviderKind, answer: impl Into<String>, review: Outcome) -> Arc<Self> {
        Arc::new(Self {
            kind,
            answer: Outcome::Text(answer.into()),
            review,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<CompletionRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        self.calls.lock().unwrap().push(request.clone());
        let outcome = match request.tier {
            ModelTier::Answer => &self.answer,
            ModelTier::Review => &self.review,
        };
        match outcome {
            Outcome::Text(text) => Ok(text.clone()),
            Outcome::Fail => Err(ProviderError::Status {
                provider: self.kind,
                status: 503,
                body: "scripted failure".into(),
            }),
        }
    }
}

pub fn orchestrator(providers: &[Arc<ScriptedProvider>]) -> Orchestrator {
    Orchestrator::new(
        providers
            .iter()
            .map(|p| p.clone() as Arc<dyn ChatProvider>)
            .collect(),
        mentor_core::agents::DEFAULT_FALLBACK_ORDER.to_vec(),
        HistoryLimits::default(),
    )
}

pub struct FakeSpeech {
    pub calls: Mutex<Vec<(String, String)>>,
    pub fail: bool,
}

impl FakeSpeech {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            fail: false,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSpeech {
    fn default_voice(&self) -> &str {
        "default-voice"
    }

    fn max_chars(&self) -> usize {
        1000
    }

    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Bytes, MentorError> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), voice_id.to_string()));
        if self.fail {
            return Err(MentorError::SpeechUnavailable("scripted".into()));
        }
        Ok(Bytes::from_static(b"ID3fake-mp3"))
    }
}

pub fn api_state(
    providers: &[Arc<ScriptedProvider>],
    speech: Option<Arc<FakeSpeech>>,
) -> ApiState {
    ApiState {
        orchestrator: Arc::new(orchestrator(providers)),
        personas: Arc::new(PersonaRegistry::builtin()),
        speech: speech.map(|s| s as Arc<dyn SpeechSynthesizer>),
    }
}
