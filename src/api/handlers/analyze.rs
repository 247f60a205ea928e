use crate::{
    AppState,
    auth::middleware::UserId,
    types::{AnalyzeRequest, AppError, Query, Result, RoutingPreview},
};
use axum::{Json, extract::State};

/// Show how a query would be routed without invoking any agent
#[utoipa::path(
    post,
    path = "/api/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Routing preview", body = RoutingPreview),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Missing or invalid API key")
    ),
    tag = "routing"
)]
pub async fn analyze(
    State(state): State<AppState>,
    UserId(user_id): UserId,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<Json<RoutingPreview>> {
    if payload.text.trim().is_empty() {
        return Err(AppError::InvalidInput("text must not be empty".to_string()));
    }

    let query = Query::new(payload.text, user_id, "preview");
    Ok(Json(state.orchestrator.preview(&query)))
}
