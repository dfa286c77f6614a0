use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};

use super::config::{EdgeConfig, ProviderSettings};
use super::providers::{ProviderKind, WireFormat};
use crate::conversation::ChatMessage;
use crate::errors::ProviderError;

/// Which of a provider's models a call should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    Answer,
    Review,
}

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// May be empty, in which case no system turn is sent.
    pub system_prompt: String,
    pub messages: Vec<ChatMessage>,
    pub tier: ModelTier,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn answer(system_prompt: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            messages,
            tier: ModelTier::Answer,
            temperature: 0.7,
            max_tokens: 1000,
        }
    }

    pub fn review(system_prompt: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            messages: vec![ChatMessage::user(text)],
            tier: ModelTier::Review,
            temperature: 0.3,
            max_tokens: 1000,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// One external chat-completion backend. Implementations make a single
/// attempt and report failure immediately; retrying is the caller's call.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;
}

pub fn build_client(timeout: Option<Duration>) -> Result<Client> {
    let mut builder = Client::builder().user_agent(concat!(
        "mentor-edge/",
        env!("CARGO_PKG_VERSION")
    ));
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().context("failed to construct HTTP client")
}

/// Build one HTTP adapter per configured provider, sharing a client.
pub fn http_providers(config: &EdgeConfig) -> Result<Vec<Arc<dyn ChatProvider>>> {
    let client = build_client(config.provider_timeout)?;
    Ok(config
        .providers
        .iter()
        .cloned()
        .map(|settings| Arc::new(HttpChatProvider::new(client.clone(), settings)) as Arc<dyn ChatProvider>)
        .collect())
}

pub struct HttpChatProvider {
    client: Client,
    settings: ProviderSettings,
}

impl HttpChatProvider {
    pub fn new(client: Client, settings: ProviderSettings) -> Self {
        Self { client, settings }
    }

    fn model(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Answer => &self.settings.model,
            ModelTier::Review => &self.settings.review_model,
        }
    }

    fn url(&self) -> String {
        format!(
            "{}{}",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.kind.seed().chat_path
        )
    }

    async fn chat_openai_like(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if !request.system_prompt.is_empty() {
            messages.push(json!({"role": "system", "content": request.system_prompt}));
        }
        messages.extend(request.messages.iter().map(|m| {
            json!({
                "role": m.role,
                "content": m.content,
            })
        }));

        let payload = json!({
            "model": self.model(request.tier),
            "messages": messages,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        let http = self
            .client
            .post(self.url())
            .bearer_auth(&self.settings.api_key)
            .json(&payload);
        let body = self.send(http).await?;
        extract_openai_content(&body).ok_or(ProviderError::MalformedResponse {
            provider: self.settings.kind,
            field: "choices[0].message.content",
        })
    }

    async fn chat_gemini(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let endpoint = format!("{}/{}:generateContent", self.url(), self.model(request.tier));
        let payload = json!({
            "contents": [
                {
                    "parts": [{"text": gemini_prompt(request)}]
                }
            ],
            "generationConfig": {
                "temperature": request.temperature,
                "maxOutputTokens": request.max_tokens,
            }
        });

        let http = self
            .client
            .post(endpoint)
            .query(&[("key", self.settings.api_key.as_str())])
            .json(&payload);
        let body = self.send(http).await?;
        extract_gemini_text(&body).ok_or(ProviderError::MalformedResponse {
            provider: self.settings.kind,
            field: "candidates[0].content.parts[0].text",
        })
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, ProviderError> {
        let provider = self.settings.kind;
        // Gemini carries its key in the query string, so URLs never reach error text.
        let transport = |source: reqwest::Error| ProviderError::Transport {
            provider,
            source: source.without_url(),
        };
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider,
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }
        response.json::<Value>().await.map_err(transport)
    }
}

#[async_trait]
impl ChatProvider for HttpChatProvider {
    fn kind(&self) -> ProviderKind {
        self.settings.kind
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        match self.settings.kind.seed().wire {
            WireFormat::OpenAiChat => self.chat_openai_like(request).await,
            WireFormat::GeminiGenerate => self.chat_gemini(request).await,
        }
    }
}

/// Gemini takes a single text part, so the system prompt and the transcript
/// are flattened into one document. A lone review message is sent as is.
fn gemini_prompt(request: &CompletionRequest) -> String {
    if request.system_prompt.is_empty() {
        if let [only] = request.messages.as_slice() {
            return only.content.clone();
        }
    }
    let conversation = request
        .messages
        .iter()
        .map(|m| format!("{}: {}", m.role.label(), m.content))
        .collect::<Vec<_>>()
        .join("\n\n");
    if request.system_prompt.is_empty() {
        conversation
    } else {
        format!("{}\n\nConversation:\n{}", request.system_prompt, conversation)
    }
}

fn extract_openai_content(body: &Value) -> Option<String> {
    body.get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|msg| msg.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn extract_gemini_text(body: &Value) -> Option<String> {
    body.get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|cand| cand.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(|parts| parts.get(0))
        .and_then(|part| part.get("text"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gemini_prompt_flattens_system_and_transcript() {
        let request = CompletionRequest::answer(
            "Be kind.",
            vec![ChatMessage::user("Hi"), ChatMessage::assistant("Hello!")],
        );
        assert_eq!(
            gemini_prompt(&request),
            "Be kind.\n\nConversation:\nUser: Hi\n\nAssistant: Hello!"
        );
    }

    #[test]
    fn gemini_prompt_passes_review_text_through() {
        let request = CompletionRequest::review("", "Review this answer");
        assert_eq!(gemini_prompt(&request), "Review this answer");
    }

    #[test]
    fn extracts_text_fields() {
        let openai = json!({"choices": [{"message": {"content": "answer"}}]});
        assert_eq!(extract_openai_content(&openai).as_deref(), Some("answer"));
        assert_eq!(extract_openai_content(&json!({"choices": []})), None);

        let gemini = json!({"candidates": [{"content": {"parts": [{"text": ""}]}}]});
        assert_eq!(extract_gemini_text(&gemini).as_deref(), Some(""));
        assert_eq!(extract_gemini_text(&json!({})), None);
    }
}
