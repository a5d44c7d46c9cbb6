//! HTTP front end for the conversational order flow.
//!
//! Provides the chat endpoint and session inspection routes, with
//! structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod demo;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use order_flow::{Collaborators, FlowConfig, OrderFlowEngine, OrderStrategy};
use store::SessionStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use demo::DemoShop;

/// Shared application state accessible from all handlers.
pub struct AppState {
    /// Answers chat turns.
    pub strategy: Arc<dyn OrderStrategy>,
    /// Session inspection and out-of-turn operations.
    pub engine: Arc<OrderFlowEngine>,
}

impl AppState {
    /// State whose chat turns are handled by `engine` itself.
    pub fn new(engine: Arc<OrderFlowEngine>) -> Self {
        Self {
            strategy: engine.clone(),
            engine,
        }
    }
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/chat", post(routes::chat::send))
        .route("/sessions/{id}", get(routes::sessions::get))
        .route("/sessions/{id}/shipping", post(routes::sessions::shipping))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state over the seeded demo shop.
pub fn create_default_state(
    sessions: Arc<dyn SessionStore>,
    config: FlowConfig,
) -> (Arc<AppState>, DemoShop) {
    let shop = DemoShop::seeded();
    let collaborators = Collaborators {
        sessions,
        carts: Arc::new(shop.carts.clone()),
        products: Arc::new(shop.products.clone()),
        users: Arc::new(shop.users.clone()),
        orders: Arc::new(shop.orders.clone()),
        shipping: Arc::new(shop.shipping.clone()),
    };

    let engine = Arc::new(OrderFlowEngine::new(collaborators, config));
    (Arc::new(AppState::new(engine)), shop)
}
