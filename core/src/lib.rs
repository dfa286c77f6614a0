//! Core library for the mentor edge service.
//!
//! - [`agents`] holds provider adapters, the provider table and start-up configuration.
//! - [`personas`] is the static persona registry.
//! - [`conversation`] sanitizes client supplied chat history.
//! - [`orchestrator`] runs the ordered fallback chain and refinement passes.
//! - [`speech`] wraps the text-to-speech provider.
//! - [`api`] exposes the HTTP handlers and router.
//! - [`errors`] keeps the error catalogue with human friendly metadata.
//! - [`logging`] writes structured diagnostic events.

pub mod agents;
pub mod api;
pub mod conversation;
pub mod errors;
pub mod logging;
pub mod orchestrator;
pub mod personas;
pub mod speech;

use std::sync::Arc;

use anyhow::Result;

use crate::agents::adapter::build_client;
use crate::agents::EdgeConfig;
use crate::api::ApiState;
use crate::orchestrator::Orchestrator;
use crate::personas::PersonaRegistry;
use crate::speech::{ElevenLabsSpeech, SpeechSynthesizer};

/// Wire the HTTP-backed orchestrator and speech provider from configuration.
pub fn build_state(config: &EdgeConfig) -> Result<ApiState> {
    let orchestrator = Orchestrator::from_config(config)?;
    let speech = match &config.speech {
        Some(settings) => {
            let client = build_client(config.provider_timeout)?;
            Some(Arc::new(ElevenLabsSpeech::new(client, settings.clone())) as Arc<dyn SpeechSynthesizer>)
        }
        None => None,
    };
    Ok(ApiState {
        orchestrator: Arc::new(orchestrator),
        personas: Arc::new(PersonaRegistry::builtin()),
        speech,
    })
}
