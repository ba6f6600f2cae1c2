//! 规则管理服务入口
//!
//! 提供规则创建、组合、查询与评估的 REST API。

use axum::{http::HeaderValue, middleware};
use rule_admin_service::{SERVICE_NAME, routes, state::AppState};
use rule_engine::RuleStore;
use rule_shared::{
    config::AppConfig,
    observability::{self, middleware as obs_middleware},
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load(SERVICE_NAME)?;

    let _guard = observability::init(&config.observability()).await?;

    info!(
        environment = %config.environment,
        trace_evaluations = config.rules.trace_evaluations,
        "Starting {} on {}",
        SERVICE_NAME,
        config.server_addr()
    );

    let state = AppState::new(RuleStore::new(), config.rules.clone());

    let app = routes::app(state)
        .layer(cors_layer(config.is_production()))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(obs_middleware::http_tracing))
        .layer(middleware::from_fn(obs_middleware::request_id));

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!("Listening on {}", config.server_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");

    Ok(())
}

/// CORS 配置：通过 RULE_CORS_ORIGINS 环境变量控制允许的来源
fn cors_layer(is_production: bool) -> CorsLayer {
    let allowed_origins = std::env::var("RULE_CORS_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string());

    if allowed_origins == "*" {
        if is_production {
            warn!("RULE_CORS_ORIGINS=\"*\" 在生产环境中不安全，请设置为具体域名");
        }
        info!("CORS allowed_origins: * (all origins)");
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    info!("CORS allowed_origins: {}", allowed_origins);
    let origins: Vec<_> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse::<HeaderValue>().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// 监听关闭信号
///
/// 收到 Ctrl+C 或 SIGTERM 后返回，触发 axum 的优雅关闭流程。
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "注册 Ctrl+C 处理器失败");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "注册 SIGTERM 处理器失败");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown..."),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown..."),
    }
}
