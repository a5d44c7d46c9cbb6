//! Chat endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::{SessionId, UserId};
use order_flow::{RequestContext, Response};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Continues an existing conversation; a new one is started when absent.
    pub session_id: Option<String>,
    /// Authenticated shopper, as resolved by the gateway.
    pub user_id: Option<String>,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub strategy: &'static str,
    #[serde(flatten)]
    pub response: Response,
}

/// POST /chat: run one conversational turn.
#[tracing::instrument(skip(state, req), fields(session_id = tracing::field::Empty))]
pub async fn send(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let message = req.message.trim();
    if message.is_empty() {
        return Err(ApiError::BadRequest("message must not be empty".to_string()));
    }

    let session_id = match req.session_id.filter(|id| !id.trim().is_empty()) {
        Some(id) => SessionId::from(id),
        None => SessionId::from(uuid::Uuid::new_v4().to_string()),
    };
    tracing::Span::current().record("session_id", session_id.as_str());

    let ctx = RequestContext {
        user_id: req.user_id.filter(|id| !id.is_empty()).map(UserId::from),
    };

    metrics::counter!("chat_requests_total", "strategy" => state.strategy.name()).increment(1);
    let response = state.strategy.handle(message, &session_id, &ctx).await;

    Ok(Json(ChatResponse {
        session_id: session_id.as_str().to_string(),
        strategy: state.strategy.name(),
        response,
    }))
}
