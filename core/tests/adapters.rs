//! Wire format of the HTTP adapters against a local stand-in server.

use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use mentor_core::agents::adapter::build_client;
use mentor_core::agents::{
    ChatProvider, CompletionRequest, HttpChatProvider, ProviderKind, ProviderSettings,
    SpeechSettings,
};
use mentor_core::conversation::ChatMessage;
use mentor_core::errors::{MentorError, ProviderError};
use mentor_core::speech::{ElevenLabsSpeech, SpeechSynthesizer};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

#[derive(Debug, Clone)]
struct Captured {
    path: String,
    query: String,
    headers: HeaderMap,
    body: Bytes,
}

impl Captured {
    fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("json request body")
    }
}

#[derive(Clone, Copy)]
enum Mode {
    Ok,
    ServerError,
    Malformed,
}

#[derive(Clone)]
struct Upstream {
    mode: Mode,
    seen: Arc<Mutex<Vec<Captured>>>,
}

async fn record(
    State(upstream): State<Upstream>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    upstream.seen.lock().unwrap().push(Captured {
        path: uri.path().to_string(),
        query: uri.query().unwrap_or_default().to_string(),
        headers,
        body,
    });
    match upstream.mode {
        Mode::ServerError => (StatusCode::SERVICE_UNAVAILABLE, "overloaded").into_response(),
        Mode::Malformed => axum::Json(json!({"unexpected": true})).into_response(),
        Mode::Ok if uri.path().contains(":generateContent") => axum::Json(json!({
            "candidates": [{"content": {"parts": [{"text": "gemini says hi"}]}}]
        }))
        .into_response(),
        Mode::Ok if uri.path().contains("/text-to-speech/") => {
            ([("content-type", "audio/mpeg")], Bytes::from_static(b"ID3audio")).into_response()
        }
        Mode::Ok => axum::Json(json!({
            "choices": [{"message": {"role": "assistant", "content": "chat says hi"}}]
        }))
        .into_response(),
    }
}

/// Spawn a stand-in upstream and return its base URL.
async fn spawn_upstream(mode: Mode) -> (String, Arc<Mutex<Vec<Captured>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new().fallback(record).with_state(Upstream {
        mode,
        seen: seen.clone(),
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    (format!("http://{addr}"), seen)
}

fn provider(kind: ProviderKind, base_url: &str) -> HttpChatProvider {
    let settings = ProviderSettings::from_seed(kind.seed(), "test-key").with_base_url(base_url);
    HttpChatProvider::new(build_client(None).expect("client"), settings)
}

fn sample_request() -> CompletionRequest {
    CompletionRequest::answer(
        "You are Einstein.",
        vec![ChatMessage::user("Hi"), ChatMessage::assistant("Hello")],
    )
    .with_temperature(0.8)
    .with_max_tokens(1000)
}

#[tokio::test]
async fn openai_request_shape() {
    let (base, seen) = spawn_upstream(Mode::Ok).await;
    let text = provider(ProviderKind::OpenAi, &base)
        .complete(&sample_request())
        .await
        .expect("completion");
    assert_eq!(text, "chat says hi");

    let captured = seen.lock().unwrap()[0].clone();
    assert_eq!(captured.path, "/v1/chat/completions");
    assert_eq!(captured.headers["authorization"], "Bearer test-key");
    let body = captured.json();
    assert_eq!(body["model"], "gpt-4o-mini");
    assert_eq!(body["max_tokens"], 1000);
    assert_eq!(
        body["messages"],
        json!([
            {"role": "system", "content": "You are Einstein."},
            {"role": "user", "content": "Hi"},
            {"role": "assistant", "content": "Hello"},
        ])
    );
}

#[tokio::test]
async fn deepseek_uses_its_own_path_and_model() {
    let (base, seen) = spawn_upstream(Mode::Ok).await;
    provider(ProviderKind::DeepSeek, &base)
        .complete(&sample_request())
        .await
        .expect("completion");

    let captured = seen.lock().unwrap()[0].clone();
    assert_eq!(captured.path, "/chat/completions");
    assert_eq!(captured.json()["model"], "deepseek-chat");
}

#[tokio::test]
async fn gemini_request_shape() {
    let (base, seen) = spawn_upstream(Mode::Ok).await;
    let text = provider(ProviderKind::Gemini, &base)
        .complete(&sample_request())
        .await
        .expect("completion");
    assert_eq!(text, "gemini says hi");

    let captured = seen.lock().unwrap()[0].clone();
    assert_eq!(captured.path, "/models/gemini-1.5-pro:generateContent");
    assert_eq!(captured.query, "key=test-key");
    let body = captured.json();
    assert_eq!(
        body["contents"][0]["parts"][0]["text"],
        "You are Einstein.\n\nConversation:\nUser: Hi\n\nAssistant: Hello"
    );
    assert_eq!(body["generationConfig"]["maxOutputTokens"], 1000);
}

#[tokio::test]
async fn gemini_review_uses_review_model() {
    let (base, seen) = spawn_upstream(Mode::Ok).await;
    provider(ProviderKind::Gemini, &base)
        .complete(&CompletionRequest::review("", "Check this"))
        .await
        .expect("completion");

    let captured = seen.lock().unwrap()[0].clone();
    assert_eq!(captured.path, "/models/gemini-1.5-flash:generateContent");
    assert_eq!(captured.json()["contents"][0]["parts"][0]["text"], "Check this");
}

#[tokio::test]
async fn non_success_status_is_a_provider_error() {
    let (base, _) = spawn_upstream(Mode::ServerError).await;
    let err = provider(ProviderKind::OpenAi, &base)
        .complete(&sample_request())
        .await
        .expect_err("status error");
    match err {
        ProviderError::Status { provider, status, body } => {
            assert_eq!(provider, ProviderKind::OpenAi);
            assert_eq!(status, 503);
            assert_eq!(body, "overloaded");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn missing_text_field_is_malformed() {
    let (base, _) = spawn_upstream(Mode::Malformed).await;
    let err = provider(ProviderKind::Gemini, &base)
        .complete(&sample_request())
        .await
        .expect_err("malformed");
    assert!(matches!(
        err,
        ProviderError::MalformedResponse {
            provider: ProviderKind::Gemini,
            ..
        }
    ));
}

#[tokio::test]
async fn transport_errors_do_not_leak_the_key() {
    let settings = ProviderSettings::from_seed(ProviderKind::Gemini.seed(), "very-secret-key")
        .with_base_url("http://127.0.0.1:1");
    let err = HttpChatProvider::new(build_client(None).expect("client"), settings)
        .complete(&sample_request())
        .await
        .expect_err("connection refused");
    assert!(matches!(err, ProviderError::Transport { .. }));
    assert!(!err.to_string().contains("very-secret-key"));
}

#[tokio::test]
async fn elevenlabs_request_shape() {
    let (base, seen) = spawn_upstream(Mode::Ok).await;
    let mut settings = SpeechSettings::new("xi-key");
    settings.base_url = base;
    let speech = ElevenLabsSpeech::new(build_client(None).expect("client"), settings);

    let audio = speech
        .synthesize("Salom", "EXAVITQu4vr4xnSDxMaL")
        .await
        .expect("audio");
    assert_eq!(&audio[..], b"ID3audio");

    let captured = seen.lock().unwrap()[0].clone();
    assert_eq!(captured.path, "/v1/text-to-speech/EXAVITQu4vr4xnSDxMaL");
    assert_eq!(captured.query, "output_format=mp3_44100_128");
    assert_eq!(captured.headers["xi-api-key"], "xi-key");
    let body = captured.json();
    assert_eq!(body["text"], "Salom");
    assert_eq!(body["model_id"], "eleven_multilingual_v2");
    assert_eq!(body["voice_settings"]["similarity_boost"], 0.75);
}

#[tokio::test]
async fn elevenlabs_failure_is_speech_unavailable() {
    let (base, _) = spawn_upstream(Mode::ServerError).await;
    let mut settings = SpeechSettings::new("xi-key");
    settings.base_url = base;
    let speech = ElevenLabsSpeech::new(build_client(None).expect("client"), settings);

    let err = speech.synthesize("Salom", "voice").await.expect_err("failure");
    assert!(matches!(err, MentorError::SpeechUnavailable(_)));
}
