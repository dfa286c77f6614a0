//! Text-to-speech through ElevenLabs.

use async_trait::async_trait;
use axum::body::Bytes;
use log::Level;
use reqwest::Client;
use serde_json::json;

use crate::agents::SpeechSettings;
use crate::conversation::truncate_chars;
use crate::errors::MentorError;
use crate::logging::log_event;

const MODULE: &str = "ai.speech";

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    fn default_voice(&self) -> &str;

    fn max_chars(&self) -> usize;

    /// Returns MP3 audio.
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Bytes, MentorError>;
}

pub struct ElevenLabsSpeech {
    client: Client,
    settings: SpeechSettings,
}

impl ElevenLabsSpeech {
    pub fn new(client: Client, settings: SpeechSettings) -> Self {
        Self { client, settings }
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSpeech {
    fn default_voice(&self) -> &str {
        &self.settings.default_voice
    }

    fn max_chars(&self) -> usize {
        self.settings.max_chars
    }

    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Bytes, MentorError> {
        let url = format!(
            "{}/v1/text-to-speech/{}",
            self.settings.base_url.trim_end_matches('/'),
            voice_id
        );
        let payload = json!({
            "text": text,
            "model_id": self.settings.model_id,
            "voice_settings": {
                "stability": 0.5,
                "similarity_boost": 0.75,
                "style": 0.5,
                "use_speaker_boost": true,
            }
        });

        let response = self
            .client
            .post(url)
            .query(&[("output_format", "mp3_44100_128")])
            .header("xi-api-key", &self.settings.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|err| MentorError::SpeechUnavailable(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MentorError::SpeechUnavailable(format!(
                "ElevenLabs returned HTTP {}",
                status.as_u16()
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|err| MentorError::SpeechUnavailable(err.to_string()))?;
        log_event(
            Level::Info,
            Some("TTS-0200"),
            MODULE,
            "speech generated",
            None,
            Some(json!({ "voice": voice_id, "chars": text.chars().count(), "bytes": audio.len() })),
        );
        Ok(audio)
    }
}

/// Cut to `max_chars` then trim; `None` when nothing is left to speak.
pub fn prepare_text(text: &str, max_chars: usize) -> Option<String> {
    let text = truncate_chars(text, max_chars);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
