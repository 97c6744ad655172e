//! HTTP and WebSocket API surface.

pub mod http;
pub mod ws;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::rooms::RoomRegistry;

/// Shared state for all handlers.
#[derive(Default)]
pub struct AppState {
    pub rooms: RoomRegistry,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Assemble the full relay router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(http::routes())
        .route("/ws/{id}", get(ws::ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
