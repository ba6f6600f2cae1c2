//! 路由配置

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::{handlers, state::AppState};

/// 规则 API 路由，挂载在 `/api/v1` 下
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(handlers::rule::create_rule))
        .route("/update/{id}", put(handlers::rule::update_rule))
        .route("/combine", post(handlers::rule::combine_rules))
        .route("/evaluate", post(handlers::rule::evaluate_rule))
        .route("/rule/{id}", get(handlers::rule::get_rule))
        .route("/fetch", get(handlers::rule::fetch_rules))
        .route("/health", get(handlers::health::health_check))
}

/// 完整应用路由（不含中间件）
pub fn app(state: AppState) -> Router {
    Router::new().nest("/api/v1", api_routes()).with_state(state)
}
