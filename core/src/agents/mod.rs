pub mod adapter;
pub mod config;
pub mod providers;

pub use adapter::{ChatProvider, CompletionRequest, HttpChatProvider, ModelTier};
pub use config::{EdgeConfig, HistoryLimits, ProviderSettings, SpeechSettings};
pub use providers::{ProviderKind, DEFAULT_FALLBACK_ORDER, PROVIDER_SEEDS};
