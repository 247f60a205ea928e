use crate::{
    AppState,
    auth::middleware::UserId,
    types::{AppError, ChatRequest, ChatResponse, Query, Result},
};
use axum::{
    Json,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Turn a validated request into a query, minting a session id if needed
fn build_query(payload: ChatRequest, user_id: String) -> Result<Query> {
    let text = payload.text.trim();
    if text.is_empty() {
        return Err(AppError::InvalidInput("text must not be empty".to_string()));
    }

    let session_id = payload
        .session_id
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    Ok(Query::new(text, user_id, session_id).with_context(payload.context))
}

/// Chat with the GENESIS agent team
#[utoipa::path(
    post,
    path = "/api/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Chat response", body = ChatResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Missing or invalid API key")
    ),
    tag = "chat"
)]
pub async fn chat(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let query = build_query(payload, user_id)?;
    Ok(Json(state.orchestrator.handle(query).await))
}

/// WebSocket chat: one chat request JSON per text frame, one response per request
#[utoipa::path(
    get,
    path = "/api/chat/ws",
    responses(
        (status = 101, description = "Switching to WebSocket"),
        (status = 401, description = "Missing or invalid API key")
    ),
    tag = "chat"
)]
pub async fn chat_ws(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    UserId(user_id): UserId,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, user_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, user_id: String) {
    info!(user_id = %user_id, "WebSocket chat connection established");
    let (mut sender, mut receiver) = socket.split();

    while let Some(frame) = receiver.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                warn!(error = %e, "WebSocket receive error");
                break;
            }
        };

        let reply = match serde_json::from_str::<ChatRequest>(text.as_str())
            .map_err(|e| AppError::InvalidInput(format!("malformed chat request: {}", e)))
            .and_then(|payload| build_query(payload, user_id.clone()))
        {
            Ok(query) => serde_json::to_string(&state.orchestrator.handle(query).await),
            Err(e) => {
                debug!(error = %e, "Rejected WebSocket frame");
                serde_json::to_string(&serde_json::json!({ "error": e.to_string() }))
            }
        };

        let reply = match reply {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to encode WebSocket reply");
                continue;
            }
        };

        if sender.send(Message::Text(reply.into())).await.is_err() {
            break;
        }
    }

    info!(user_id = %user_id, "WebSocket chat connection closed");
}
