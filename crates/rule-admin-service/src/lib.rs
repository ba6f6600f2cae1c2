//! 规则管理服务
//!
//! 通过 REST API 暴露规则引擎：创建、更新、查询、组合与评估规则。
//!
//! ## 模块结构
//!
//! - `dto`: 请求和响应的数据传输对象
//! - `error`: 错误类型及 HTTP 映射
//! - `handlers`: HTTP 请求处理器
//! - `routes`: 路由配置
//! - `state`: 应用状态

pub mod dto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use dto::{ApiResponse, CombineRulesRequest, EvaluateRequest, FetchParams, RuleRequest};
pub use error::AdminError;
pub use state::AppState;

/// 服务名称，用于配置加载和日志标识
pub const SERVICE_NAME: &str = "rule-admin-service";
