//! 响应 DTO 定义

use rule_engine::{CompiledRule, Expression, Rule, RuleStoreStats};
use serde::Serialize;

/// API 统一响应
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self::success_with_message(data, "操作成功")
    }

    /// 创建带自定义消息的成功响应
    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: message.into(),
            data: Some(data),
        }
    }
}

/// 规则及其语法树
///
/// 创建、更新、组合接口返回，规则字段平铺在顶层。
#[derive(Debug, Serialize)]
pub struct RuleDto {
    #[serde(flatten)]
    pub rule: Rule,
    pub ast: Expression,
}

impl From<CompiledRule> for RuleDto {
    fn from(compiled: CompiledRule) -> Self {
        Self {
            rule: compiled.rule,
            ast: compiled.expression,
        }
    }
}

/// 健康检查响应
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: String,
    pub rules: RuleStoreStats,
}
