//! Admin surface for teaching Chris
//!
//! Operators POST free-form instructions; the rule parser extracts the
//! trigger/response pair or reports that nothing matched.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use chris::{CallSummary, LearnedRule};

use crate::{error::ApiError, response::ApiResponse, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/rules", post(teach_rule).get(list_rules))
        .route("/admin/calls", get(list_calls))
        .route("/admin/stats", get(admin_stats))
}

#[derive(Debug, Deserialize)]
struct TeachRequest {
    instruction: String,
}

/// Teach a new trigger/response rule
///
/// POST /admin/rules
async fn teach_rule(
    State(assistant): State<AppState>,
    Json(request): Json<TeachRequest>,
) -> Result<Json<ApiResponse<LearnedRule>>, ApiError> {
    let rule = assistant.rules().teach(&request.instruction).await?;
    Ok(Json(ApiResponse::success(rule)))
}

/// List learned rules
///
/// GET /admin/rules
async fn list_rules(
    State(assistant): State<AppState>,
) -> Json<ApiResponse<Vec<LearnedRule>>> {
    let rules = assistant.rules().rules().await;
    Json(ApiResponse::success(rules))
}

/// List active calls with their request state
///
/// GET /admin/calls
async fn list_calls(
    State(assistant): State<AppState>,
) -> Json<ApiResponse<Vec<CallSummary>>> {
    let calls = assistant.sessions().summaries().await;
    Json(ApiResponse::success(calls))
}

#[derive(Debug, Serialize)]
struct AdminStats {
    rules: usize,
    instructions_seen: u64,
    active_calls: usize,
}

/// Teaching and call counters
///
/// GET /admin/stats
async fn admin_stats(State(assistant): State<AppState>) -> Json<ApiResponse<AdminStats>> {
    let stats = assistant.rules().stats().await;
    let active_calls = assistant.sessions().active_count().await;
    Json(ApiResponse::success(AdminStats {
        rules: stats.rules,
        instructions_seen: stats.instructions_seen,
        active_calls,
    }))
}
