//! Routes a conversation through the configured providers with ordered
//! fallback, then through the persona's refinement passes.
//!
//! Callers hand over a sanitized history and a persona and get back one
//! answer plus a record of which providers produced it. Which backend
//! ultimately answered is invisible to them.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use log::Level;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::agents::adapter::{http_providers, ChatProvider};
use crate::agents::{EdgeConfig, HistoryLimits, ProviderKind};
use crate::conversation::ConversationHistory;
use crate::errors::{MentorError, ProviderError};
use crate::logging::log_event;
use crate::personas::{Persona, RefinementPass};

const MODULE: &str = "ai.runtime";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Complete,
    Failed,
}

/// One provider call as shown to the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingStep {
    pub model: String,
    pub stage: String,
    pub status: StepStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationResult {
    pub answer: String,
    /// Providers whose output made it into `answer`, in call order.
    pub providers_used: Vec<ProviderKind>,
    pub thinking_steps: Vec<ThinkingStep>,
}

pub struct Orchestrator {
    providers: Vec<Arc<dyn ChatProvider>>,
    fallback_order: Vec<ProviderKind>,
    limits: HistoryLimits,
}

impl Orchestrator {
    /// `providers` holds only backends that can actually be called.
    pub fn new(
        providers: Vec<Arc<dyn ChatProvider>>,
        fallback_order: Vec<ProviderKind>,
        limits: HistoryLimits,
    ) -> Self {
        Self {
            providers,
            fallback_order,
            limits,
        }
    }

    pub fn from_config(config: &EdgeConfig) -> Result<Self> {
        Ok(Self::new(
            http_providers(config)?,
            config.fallback_order.clone(),
            config.limits,
        ))
    }

    pub fn limits(&self) -> HistoryLimits {
        self.limits
    }

    pub fn configured(&self) -> Vec<ProviderKind> {
        self.providers.iter().map(|p| p.kind()).collect()
    }

    fn provider(&self, kind: ProviderKind) -> Option<&Arc<dyn ChatProvider>> {
        self.providers.iter().find(|p| p.kind() == kind)
    }

    /// Preferred provider first, then the persona's own order, then the
    /// configured fallback order, skipping anything without a credential or
    /// already listed.
    pub fn candidates(
        &self,
        preferred: ProviderKind,
        persona_order: &[ProviderKind],
    ) -> Vec<ProviderKind> {
        let mut seen = HashSet::new();
        std::iter::once(preferred)
            .chain(persona_order.iter().copied())
            .chain(self.fallback_order.iter().copied())
            .filter(|kind| self.provider(*kind).is_some())
            .filter(|kind| seen.insert(*kind))
            .collect()
    }

    pub async fn answer(
        &self,
        persona: &Persona,
        history: &ConversationHistory,
    ) -> Result<OrchestrationResult, MentorError> {
        if history.is_empty() {
            return Err(MentorError::Validation("No valid messages".into()));
        }

        let trace_id = Uuid::new_v4().to_string();
        let mut steps = Vec::new();
        let mut failed = HashSet::new();

        let Some((primary, answer)) = self
            .primary_answer(persona, history, &trace_id, &mut steps, &mut failed)
            .await
        else {
            log_event(
                Level::Error,
                Some(MentorError::NoProviderAvailable.code()),
                MODULE,
                "no AI provider produced an answer",
                Some(MentorError::NoProviderAvailable.explain()),
                Some(json!({
                    "trace": trace_id,
                    "persona": persona.id,
                    "configured": self.configured(),
                })),
            );
            return Err(MentorError::NoProviderAvailable);
        };

        let mut providers_used = vec![primary];
        let mut answer = answer;
        for pass in persona.passes {
            // A provider gets at most one call per request.
            if pass.provider == primary || failed.contains(&pass.provider) {
                continue;
            }
            let Some(provider) = self.provider(pass.provider) else {
                continue;
            };
            if let Some(refined) =
                Self::refine(provider.as_ref(), persona, *pass, history, &answer, &trace_id, &mut steps)
                    .await
            {
                answer = refined;
                providers_used.push(pass.provider);
            }
        }

        Ok(OrchestrationResult {
            answer,
            providers_used,
            thinking_steps: steps,
        })
    }

    async fn primary_answer(
        &self,
        persona: &Persona,
        history: &ConversationHistory,
        trace_id: &str,
        steps: &mut Vec<ThinkingStep>,
        failed: &mut HashSet<ProviderKind>,
    ) -> Option<(ProviderKind, String)> {
        for kind in self.candidates(persona.preferred_provider, persona.fallback_order) {
            let provider = self.provider(kind)?;
            let preferred = kind == persona.preferred_provider;
            let (model, stage) = if preferred {
                (persona.primary_model.to_string(), persona.primary_stage)
            } else {
                (format!("{} (fallback)", kind.display_name()), "Generating response")
            };

            let request = persona.answer_request(kind, history);
            match provider.complete(&request).await {
                Ok(text) => {
                    log_invocation_success(trace_id, persona, kind, &text);
                    steps.push(step(model, stage, StepStatus::Complete));
                    return Some((kind, text));
                }
                Err(err) => {
                    log_invocation_failure(trace_id, persona, &err);
                    failed.insert(kind);
                    steps.push(step(model, stage, StepStatus::Failed));
                }
            }
        }
        None
    }

    async fn refine(
        provider: &dyn ChatProvider,
        persona: &Persona,
        pass: RefinementPass,
        history: &ConversationHistory,
        answer: &str,
        trace_id: &str,
        steps: &mut Vec<ThinkingStep>,
    ) -> Option<String> {
        let model = pass.provider.display_name().to_string();
        let request = persona.pass_request(pass.stage, history, answer);
        match provider.complete(&request).await {
            Ok(text) if !text.trim().is_empty() => {
                steps.push(step(model, pass.stage.label(), StepStatus::Complete));
                Some(text)
            }
            Ok(_) => {
                log_event(
                    Level::Info,
                    Some("AI-0203"),
                    MODULE,
                    "refinement pass returned no text",
                    Some("Keeping the previous answer"),
                    Some(json!({
                        "trace": trace_id,
                        "persona": persona.id,
                        "provider": pass.provider,
                        "stage": pass.stage,
                    })),
                );
                steps.push(step(model, pass.stage.label(), StepStatus::Failed));
                None
            }
            Err(err) => {
                log_event(
                    Level::Warn,
                    Some("AI-0202"),
                    MODULE,
                    "refinement pass failed",
                    Some("Keeping the previous answer"),
                    Some(json!({
                        "trace": trace_id,
                        "persona": persona.id,
                        "provider": pass.provider,
                        "stage": pass.stage,
                        "error_code": err.code(),
                        "error": err.to_string(),
                    })),
                );
                steps.push(step(model, pass.stage.label(), StepStatus::Failed));
                None
            }
        }
    }
}

fn step(model: String, stage: &str, status: StepStatus) -> ThinkingStep {
    ThinkingStep {
        model,
        stage: stage.to_string(),
        status,
    }
}

fn log_invocation_success(trace_id: &str, persona: &Persona, provider: ProviderKind, text: &str) {
    let preview = text.chars().take(200).collect::<String>();
    log_event(
        Level::Info,
        Some("AI-0200"),
        MODULE,
        "AI chat invocation succeeded",
        Some("Orchestrator resolved a provider"),
        Some(json!({
            "trace": trace_id,
            "persona": persona.id,
            "provider": provider,
            "preview": preview,
        })),
    );
}

fn log_invocation_failure(trace_id: &str, persona: &Persona, error: &ProviderError) {
    log_event(
        Level::Warn,
        Some("AI-0201"),
        MODULE,
        "AI provider invocation failed",
        Some("Attempting fallback"),
        Some(json!({
            "trace": trace_id,
            "persona": persona.id,
            "provider": error.provider(),
            "error_code": error.code(),
            "error": error.to_string(),
        })),
    );
}
