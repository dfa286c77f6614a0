//! HTTP surface exposed to the web front-end.
//!
//! Versioned modules (currently `v1`) group related handlers; [`router`]
//! mounts them behind the CORS allow-list.

pub mod cors;
pub mod v1;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{middleware, Router};

pub use cors::CorsPolicy;
pub use v1::ApiState;

pub fn router(state: ApiState, cors_policy: CorsPolicy) -> Router {
    Router::new()
        .route("/health", get(v1::ping))
        .route("/mentor-chat", post(v1::mentor_chat))
        .route("/hybrid-ai-teacher", post(v1::hybrid_ai_teacher))
        .route("/ai-teacher", post(v1::ai_teacher))
        .route("/text-to-speech", post(v1::text_to_speech))
        .layer(middleware::from_fn_with_state(
            Arc::new(cors_policy),
            cors::cors,
        ))
        .with_state(state)
}
