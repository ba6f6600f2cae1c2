//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集与导出。
//! 指标通过独立的 HTTP 端口暴露，供 Prometheus 抓取。

use anyhow::Result;
use axum::{Router, routing::get};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{error, info};

use super::ObservabilityConfig;

/// Metrics 资源守卫
pub struct MetricsHandle {
    _server_handle: tokio::task::JoinHandle<()>,
}

/// 初始化 Prometheus 指标导出
///
/// 启动一个独立的 HTTP 服务器在指定端口暴露 `/metrics` 端点。
pub async fn init(config: &ObservabilityConfig) -> Result<MetricsHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    register_common_metrics(&config.service_name);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    let server_handle = start_metrics_server(addr, handle).await?;

    Ok(MetricsHandle {
        _server_handle: server_handle,
    })
}

/// 注册指标描述（出现在 /metrics 的 HELP 注释中）
fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!("http_requests_total", "Total number of HTTP requests");
    metrics::describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );

    metrics::describe_counter!("rule_evaluations_total", "Total number of rule evaluations");
    metrics::describe_histogram!(
        "rule_evaluation_duration_seconds",
        "Rule evaluation duration in seconds"
    );

    metrics::describe_counter!("rules_created_total", "Total number of rules created");
    metrics::describe_counter!("rules_updated_total", "Total number of rules updated");
    metrics::describe_counter!(
        "rule_combinations_total",
        "Total number of rule combinations"
    );

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

/// 启动指标 HTTP 服务器
async fn start_metrics_server(
    addr: SocketAddr,
    handle: PrometheusHandle,
) -> Result<tokio::task::JoinHandle<()>> {
    let app = Router::new()
        .route("/metrics", get(move || std::future::ready(handle.render())))
        .route("/health", get(|| async { "OK" }));

    let listener = TcpListener::bind(addr).await?;
    info!("Metrics server listening on {}", addr);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("Metrics server error: {}", e);
        }
    });

    Ok(server_handle)
}

// ============================================================================
// 便捷的指标记录函数
// ============================================================================

/// 记录 HTTP 请求
#[inline]
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let status_str = status.to_string();
    metrics::counter!(
        "http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str.clone()
    )
    .increment(1);

    metrics::histogram!(
        "http_request_duration_seconds",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status_str
    )
    .record(duration_secs);
}

/// 记录规则评估
///
/// `outcome` 取值：matched / not_matched / error
#[inline]
pub fn record_rule_evaluation(outcome: &str, duration_secs: f64) {
    metrics::counter!(
        "rule_evaluations_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);

    metrics::histogram!("rule_evaluation_duration_seconds").record(duration_secs);
}

/// 记录规则创建
#[inline]
pub fn record_rule_created() {
    metrics::counter!("rules_created_total").increment(1);
}

/// 记录规则更新
#[inline]
pub fn record_rule_updated() {
    metrics::counter!("rules_updated_total").increment(1);
}

/// 记录规则组合
#[inline]
pub fn record_rule_combination(operator: &str, status: &str) {
    metrics::counter!(
        "rule_combinations_total",
        "operator" => operator.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
