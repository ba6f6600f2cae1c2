//! 健康检查

use axum::{Json, extract::State};

use crate::{SERVICE_NAME, dto::HealthResponse, state::AppState};

/// 存活探针，附带规则存储统计
///
/// GET /api/v1/health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: SERVICE_NAME.to_string(),
        rules: state.store().stats(),
    })
}
