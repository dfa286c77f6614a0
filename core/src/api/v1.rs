//! Version 1 of the HTTP API.
//!
//! Handlers are thin: they validate the body, build a sanitized history,
//! hand it to the orchestrator and serialize the result. Error bodies are
//! always `{ "error": <generic message> }`; details only go to the log.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::Level;
use serde::Deserialize;
use serde_json::{json, Value};
use time::OffsetDateTime;

use crate::agents::config::DEFAULT_MAX_SPEECH_CHARS;
use crate::conversation::ConversationHistory;
use crate::errors::MentorError;
use crate::logging::log_event;
use crate::orchestrator::{OrchestrationResult, Orchestrator};
use crate::personas::{PersonaRegistry, AI_TEACHER_ID, HYBRID_TEACHER_ID};
use crate::speech::{prepare_text, SpeechSynthesizer};

const MODULE: &str = "api.v1";
const MAX_AI_TEACHER_MESSAGES: usize = 20;

/// Shared state injected into each handler.
#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
    pub personas: Arc<PersonaRegistry>,
    pub speech: Option<Arc<dyn SpeechSynthesizer>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Option<Value>,
    #[serde(default)]
    pub mentor_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechRequest {
    #[serde(default)]
    pub text: Option<Value>,
    #[serde(default)]
    pub voice_id: Option<String>,
}

/// Health check.
pub async fn ping() -> Json<Value> {
    Json(json!({
        "ok": true,
        "ts": OffsetDateTime::now_utc().unix_timestamp(),
    }))
}

/// Chat with one of the historical mentors.
pub async fn mentor_chat(
    State(state): State<ApiState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<OrchestrationResult>, MentorError> {
    let request = parse(payload)?;
    let messages = messages_array(&request)?;
    let mentor_id = request
        .mentor_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or_else(invalid_request)?;
    run_chat(&state, mentor_id, messages).await
}

/// The school teacher with DeepSeek reasoning and two review passes.
pub async fn hybrid_ai_teacher(
    State(state): State<ApiState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<OrchestrationResult>, MentorError> {
    let request = parse(payload)?;
    let messages = messages_array(&request)?;
    run_chat(&state, HYBRID_TEACHER_ID, messages).await
}

/// The single pass school teacher.
pub async fn ai_teacher(
    State(state): State<ApiState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<OrchestrationResult>, MentorError> {
    let request = parse(payload)?;
    let messages = messages_array(&request)?;
    if messages.len() > MAX_AI_TEACHER_MESSAGES {
        return Err(MentorError::Validation("Too many messages".into()));
    }
    run_chat(&state, AI_TEACHER_ID, messages).await
}

/// Convert text to MP3 speech.
pub async fn text_to_speech(
    State(state): State<ApiState>,
    payload: Result<Json<SpeechRequest>, JsonRejection>,
) -> Result<Response, MentorError> {
    let Json(request) = payload.map_err(|_| invalid_request())?;
    let text = request
        .text
        .as_ref()
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(invalid_request)?;

    let max_chars = state
        .speech
        .as_ref()
        .map_or(DEFAULT_MAX_SPEECH_CHARS, |speech| speech.max_chars());
    let text = prepare_text(text, max_chars)
        .ok_or_else(|| MentorError::Validation("Text is required".into()))?;

    let speech = state.speech.as_ref().ok_or_else(|| {
        MentorError::SpeechUnavailable("ELEVENLABS_API_KEY is not configured".into())
    })?;
    let voice = match request.voice_id.as_deref().filter(|v| !v.is_empty()) {
        Some(voice) if voice.chars().all(|c| c.is_ascii_alphanumeric()) => voice,
        Some(_) => return Err(invalid_request()),
        None => speech.default_voice(),
    };

    let audio = speech.synthesize(&text, voice).await?;
    Ok(([(CONTENT_TYPE, "audio/mpeg")], audio).into_response())
}

async fn run_chat(
    state: &ApiState,
    persona_id: &str,
    messages: &[Value],
) -> Result<Json<OrchestrationResult>, MentorError> {
    let persona = state
        .personas
        .lookup(persona_id)
        .ok_or_else(|| MentorError::PersonaNotFound(persona_id.to_string()))?;

    let history = ConversationHistory::sanitize(messages, state.orchestrator.limits());
    if history.is_empty() {
        return Err(MentorError::Validation("No valid messages".into()));
    }

    log_event(
        Level::Info,
        None,
        MODULE,
        "processing chat",
        None,
        Some(json!({
            "persona": persona.id,
            "preferred": persona.preferred_provider,
            "messages": history.len(),
        })),
    );
    let result = state.orchestrator.answer(persona, &history).await?;
    Ok(Json(result))
}

fn parse(payload: Result<Json<ChatRequest>, JsonRejection>) -> Result<ChatRequest, MentorError> {
    payload.map(|Json(request)| request).map_err(|rejection| {
        log_event(
            Level::Debug,
            Some("REQ-1001"),
            MODULE,
            "rejected request body",
            None,
            Some(json!({ "reason": rejection.body_text() })),
        );
        invalid_request()
    })
}

fn messages_array(request: &ChatRequest) -> Result<&[Value], MentorError> {
    request
        .messages
        .as_ref()
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .ok_or_else(invalid_request)
}

fn invalid_request() -> MentorError {
    MentorError::Validation("Invalid request".into())
}

impl MentorError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::PersonaNotFound(_) => StatusCode::BAD_REQUEST,
            Self::NoProviderAvailable | Self::SpeechUnavailable(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show a client; never names missing credentials.
    pub fn public_message(&self) -> &str {
        match self {
            Self::Validation(message) => message,
            Self::PersonaNotFound(_) => "Unknown mentor",
            Self::NoProviderAvailable | Self::SpeechUnavailable(_) => "Service unavailable",
        }
    }
}

impl IntoResponse for MentorError {
    fn into_response(self) -> Response {
        let status = self.status();
        let level = if status.is_server_error() {
            Level::Error
        } else {
            Level::Warn
        };
        log_event(
            level,
            Some(self.code()),
            MODULE,
            "request failed",
            Some(self.explain()),
            Some(json!({ "detail": self.to_string(), "status": status.as_u16() })),
        );
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}
