//! 规则 API 处理器
//!
//! 创建、更新、查询、组合与评估规则。规则文本的语法和类型校验都由引擎完成，
//! 处理器只负责请求校验、指标记录和响应包装。

use std::time::Instant;

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rule_engine::{EvaluationResult, Record, Rule, RuleError, RulePage};
use rule_shared::observability::metrics;
use tracing::info;
use validator::Validate;

use crate::{
    dto::{ApiResponse, CombineRulesRequest, EvaluateRequest, FetchParams, RuleDto, RuleRequest},
    error::AdminError,
    state::AppState,
};

/// 创建规则
///
/// POST /api/v1/create
pub async fn create_rule(
    State(state): State<AppState>,
    Json(req): Json<RuleRequest>,
) -> Result<Json<ApiResponse<RuleDto>>, AdminError> {
    req.validate()?;

    let compiled = state.service.create_rule(req.into())?;
    metrics::record_rule_created();

    info!(rule_id = %compiled.id(), "Rule created");
    Ok(Json(ApiResponse::success_with_message(
        RuleDto::from(compiled),
        "规则已创建",
    )))
}

/// 整体更新规则
///
/// PUT /api/v1/update/{id}
pub async fn update_rule(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RuleRequest>,
) -> Result<Json<ApiResponse<RuleDto>>, AdminError> {
    req.validate()?;

    let compiled = state.service.update_rule(&id, req.into())?;
    metrics::record_rule_updated();

    info!(
        rule_id = %compiled.id(),
        compile_version = compiled.compile_version,
        "Rule updated"
    );
    Ok(Json(ApiResponse::success_with_message(
        RuleDto::from(compiled),
        "规则已更新",
    )))
}

/// 获取规则详情
///
/// GET /api/v1/rule/{id}
pub async fn get_rule(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Rule>>, AdminError> {
    let rule = state.service.get_rule(&id)?;
    Ok(Json(ApiResponse::success(rule)))
}

/// 分页查询规则
///
/// GET /api/v1/fetch?page=1&limit=10
pub async fn fetch_rules(
    State(state): State<AppState>,
    Query(params): Query<FetchParams>,
) -> Result<Json<ApiResponse<RulePage>>, AdminError> {
    let page = params.page.unwrap_or(1);
    let limit = state.page_limit(params.limit);

    let rules = state.service.list_rules(page, limit)?;
    Ok(Json(ApiResponse::success(rules)))
}

/// 组合已有规则
///
/// POST /api/v1/combine
pub async fn combine_rules(
    State(state): State<AppState>,
    Json(req): Json<CombineRulesRequest>,
) -> Result<Json<ApiResponse<RuleDto>>, AdminError> {
    req.validate()?;

    let operator = req.operator.to_string();
    match state.service.combine(req.into()) {
        Ok(compiled) => {
            metrics::record_rule_combination(&operator, "success");
            info!(
                rule_id = %compiled.id(),
                parents = ?compiled.rule.parent_rules,
                "Rules combined"
            );
            Ok(Json(ApiResponse::success_with_message(
                RuleDto::from(compiled),
                "规则已组合",
            )))
        }
        Err(e) => {
            metrics::record_rule_combination(&operator, "failed");
            Err(e.into())
        }
    }
}

/// 使用输入数据评估规则
///
/// POST /api/v1/evaluate
pub async fn evaluate_rule(
    State(state): State<AppState>,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<ApiResponse<EvaluationResult>>, AdminError> {
    req.validate()?;

    let start = Instant::now();
    let outcome = Record::from_json(&req.data)
        .map_err(RuleError::from)
        .and_then(|record| state.service.evaluate(&req.rule_id, &record));
    let elapsed = start.elapsed().as_secs_f64();

    match outcome {
        Ok(result) => {
            let label = if result.result { "matched" } else { "not_matched" };
            metrics::record_rule_evaluation(label, elapsed);
            Ok(Json(ApiResponse::success(result)))
        }
        Err(e) => {
            metrics::record_rule_evaluation("error", elapsed);
            Err(e.into())
        }
    }
}
