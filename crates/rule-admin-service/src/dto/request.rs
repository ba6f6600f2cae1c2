//! 请求 DTO 定义

use rule_engine::{CombineRules, LogicalOperator, NewRule};
use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

/// 创建或更新规则请求
///
/// `rule_string` 的语法由引擎校验，这里不做长度限制，空文本返回解析错误。
#[derive(Debug, Deserialize, Validate)]
pub struct RuleRequest {
    #[validate(length(min = 1, max = 100, message = "规则名称长度必须在1-100个字符之间"))]
    pub name: String,
    pub description: Option<String>,
    pub rule_string: String,
}

impl From<RuleRequest> for NewRule {
    fn from(req: RuleRequest) -> Self {
        NewRule::new(req.name, req.description.unwrap_or_default(), req.rule_string)
    }
}

/// 组合规则请求
#[derive(Debug, Deserialize, Validate)]
pub struct CombineRulesRequest {
    pub rule_ids: Vec<String>,
    #[validate(length(min = 1, max = 100, message = "规则名称长度必须在1-100个字符之间"))]
    pub name: String,
    pub description: Option<String>,
    pub operator: LogicalOperator,
}

impl From<CombineRulesRequest> for CombineRules {
    fn from(req: CombineRulesRequest) -> Self {
        CombineRules {
            rule_ids: req.rule_ids,
            name: req.name,
            description: req.description.unwrap_or_default(),
            operator: req.operator,
        }
    }
}

/// 评估请求
#[derive(Debug, Deserialize, Validate)]
pub struct EvaluateRequest {
    #[validate(length(min = 1, message = "规则 ID 不能为空"))]
    pub rule_id: String,
    pub data: Value,
}

/// 分页查询参数，缺省值由配置决定
#[derive(Debug, Default, Deserialize)]
pub struct FetchParams {
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rule_request_validation() {
        let req = RuleRequest {
            name: "".to_string(),
            description: None,
            rule_string: "age > 30".to_string(),
        };
        assert!(req.validate().is_err());

        let req = RuleRequest {
            name: "adults".to_string(),
            description: None,
            rule_string: "".to_string(),
        };
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_rule_request_into_new_rule() {
        let req: RuleRequest =
            serde_json::from_value(json!({"name": "r", "rule_string": "age > 1"})).unwrap();
        let input = NewRule::from(req);
        assert_eq!(input.description, "");
        assert_eq!(input.rule_string, "age > 1");
    }

    #[test]
    fn test_combine_request_operator() {
        let req: CombineRulesRequest = serde_json::from_value(json!({
            "rule_ids": ["a", "b"],
            "name": "both",
            "operator": "OR"
        }))
        .unwrap();
        let combine = CombineRules::from(req);
        assert_eq!(combine.operator, LogicalOperator::Or);
        assert_eq!(combine.rule_ids, vec!["a", "b"]);

        let invalid = serde_json::from_value::<CombineRulesRequest>(json!({
            "rule_ids": ["a", "b"],
            "name": "both",
            "operator": "XOR"
        }));
        assert!(invalid.is_err());
    }

    #[test]
    fn test_fetch_params_default() {
        let params: FetchParams = serde_json::from_value(json!({})).unwrap();
        assert!(params.page.is_none());
        assert!(params.limit.is_none());
    }
}
