//! 请求和响应的数据传输对象

pub mod request;
pub mod response;

pub use request::{CombineRulesRequest, EvaluateRequest, FetchParams, RuleRequest};
pub use response::{ApiResponse, HealthResponse, RuleDto};
