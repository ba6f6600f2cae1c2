//! 管理服务错误类型定义
//!
//! 引擎错误在此映射为 HTTP 状态码和统一的错误响应体。

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rule_engine::RuleError;
use serde_json::json;

/// 管理服务错误类型
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("参数验证失败: {0}")]
    Validation(String),

    #[error(transparent)]
    Rule(#[from] RuleError),
}

impl AdminError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Rule(RuleError::RuleNotFound(_)) => StatusCode::NOT_FOUND,
            Self::Rule(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Rule(err) => err.code(),
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": self.to_string(),
            "data": serde_json::Value::Null
        });

        (self.status_code(), axum::Json(body)).into_response()
    }
}

/// 从 validator 错误转换
impl From<validator::ValidationErrors> for AdminError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}
