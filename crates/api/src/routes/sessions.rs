//! Session inspection endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::SessionId;
use domain::{FlowState, OrderContext, ShippingInfo};
use serde::Serialize;

use crate::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub user_id: Option<String>,
    pub state: FlowState,
    pub context: OrderContext,
    pub cycle: u64,
    pub error_count: u32,
    pub version: u64,
    pub turns: usize,
    pub last_activity: String,
    pub last_order: Option<String>,
}

/// GET /sessions/:id: the session as the next turn would see it.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state
        .engine
        .session_state(&SessionId::from(id.as_str()))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Session {id} not found")))?;

    Ok(Json(SessionResponse {
        session_id: session.id.as_str().to_string(),
        user_id: session.user_id.map(|u| u.as_str().to_string()),
        state: session.state,
        context: session.context,
        cycle: session.cycle,
        error_count: session.error_count,
        version: session.version,
        turns: session.history.len(),
        last_activity: session.last_activity.to_rfc3339(),
        last_order: session.last_order.map(|id| id.to_string()),
    }))
}

/// POST /sessions/:id/shipping: quote shipping for a session with a bound address.
#[tracing::instrument(skip(state))]
pub async fn shipping(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ShippingInfo>, ApiError> {
    let info = state
        .engine
        .calculate_shipping(&SessionId::from(id.as_str()))
        .await?;
    Ok(Json(info))
}
