//! AI suggestion endpoints
//!
//! Each call counts against the caller's monthly usage. Upstream failures
//! never surface as errors; see [`crate::ai::AiService`].

use axum::{extract::State, Json};

use crate::ai::{
    AppIdeaRequest, OptimizeRequest, OptimizeResponse, SuggestionsResponse, TemplateResponse,
};
use crate::database::AppState;
use crate::error::AppResult;
use crate::middleware::AuthUser;
use crate::store::users;

fn count_call(state: &AppState, auth: &AuthUser, endpoint: &str) -> AppResult<()> {
    let usage = users::record_api_usage(&state.db, auth.id())?;
    tracing::debug!(user_id = %auth.id(), endpoint, monthly = usage.monthly, "AI call");
    Ok(())
}

/// `POST /api/ai/suggest-widgets`
pub async fn suggest_widgets(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<AppIdeaRequest>,
) -> AppResult<Json<SuggestionsResponse>> {
    count_call(&state, &auth, "suggest-widgets")?;
    let suggestions = state.ai.suggest_widgets(&payload).await;
    Ok(Json(SuggestionsResponse { suggestions }))
}

/// `POST /api/ai/generate-template`
pub async fn generate_template(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<AppIdeaRequest>,
) -> AppResult<Json<TemplateResponse>> {
    count_call(&state, &auth, "generate-template")?;
    let template = state.ai.generate_template(&payload).await;
    Ok(Json(TemplateResponse { template }))
}

/// `POST /api/ai/optimize-layout`
pub async fn optimize_layout(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<OptimizeRequest>,
) -> AppResult<Json<OptimizeResponse>> {
    count_call(&state, &auth, "optimize-layout")?;
    let optimized_layout = state.ai.optimize_layout(&payload.components).await;
    Ok(Json(OptimizeResponse { optimized_layout }))
}
