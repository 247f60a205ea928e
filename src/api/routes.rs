use crate::AppState;
use crate::api::ApiDoc;
use crate::api::handlers::{agents, analyze, chat};
use axum::{
    Json, Router, middleware,
    routing::{get, post},
};
use utoipa::OpenApi;

/// Maximum accepted request body
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// `/api/*` routes behind the API key guard
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/chat", post(chat::chat))
        .route("/chat/ws", get(chat::chat_ws))
        .route("/analyze", post(analyze::analyze))
        .route("/agents", get(agents::list_agents))
        .route("/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .layer(middleware::from_fn_with_state(
            state,
            crate::auth::middleware::api_key_middleware,
        ))
}

/// Full application router with state applied
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .nest("/api", api_routes(state.clone()))
        .layer(tower_http::limit::RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}
