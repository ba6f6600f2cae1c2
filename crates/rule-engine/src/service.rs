//! 规则服务
//!
//! 在注册表之上组合编译、求值与规则组合，提供创建、更新、查询、
//! 评估和组合规则的完整流程。写入前统一做语法校验，
//! 保存的 `rule_string` 一律是规范文本。

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::combiner::RuleCombiner;
use crate::compiler::CompiledRule;
use crate::error::{CombineError, Result, RuleError};
use crate::executor::RuleExecutor;
use crate::models::{CombineRules, EvaluationResult, NewRule, Record, Rule, RulePage};
use crate::parser::parse_rule;
use crate::store::RuleRegistry;

/// 规则服务
pub struct RuleService<R: RuleRegistry> {
    registry: Arc<R>,
    executor: RuleExecutor,
}

impl<R: RuleRegistry> RuleService<R> {
    pub fn new(registry: Arc<R>) -> Self {
        Self {
            registry,
            executor: RuleExecutor::new(),
        }
    }

    /// 评估结果附带追踪信息
    pub fn with_trace(mut self) -> Self {
        self.executor = self.executor.with_trace();
        self
    }

    pub fn registry(&self) -> &Arc<R> {
        &self.registry
    }

    /// 校验规则文本，返回规范文本
    pub fn validate_rule_string(&self, rule_string: &str) -> Result<String> {
        Ok(parse_rule(rule_string)?.to_canonical())
    }

    /// 创建规则
    #[instrument(skip(self, input), fields(rule_name = %input.name))]
    pub fn create_rule(&self, input: NewRule) -> Result<CompiledRule> {
        let name = validated_name(&input.name)?;
        let rule_string = self.validate_rule_string(&input.rule_string)?;

        let rule = Rule::new(name, input.description, rule_string);
        let compiled = self.registry.insert(rule)?;

        info!(rule_id = %compiled.id(), "规则已创建");
        Ok(compiled)
    }

    /// 整体更新规则，保留创建时间和来源规则
    #[instrument(skip(self, input))]
    pub fn update_rule(&self, rule_id: &str, input: NewRule) -> Result<CompiledRule> {
        let existing = self
            .registry
            .get(rule_id)
            .ok_or_else(|| RuleError::RuleNotFound(rule_id.to_string()))?;

        let name = validated_name(&input.name)?;
        let rule_string = self.validate_rule_string(&input.rule_string)?;

        let rule = Rule {
            id: existing.rule.id,
            name,
            description: input.description,
            rule_string,
            created_at: existing.rule.created_at,
            updated_at: Utc::now(),
            parent_rules: existing.rule.parent_rules,
        };
        let compiled = self.registry.replace(rule)?;

        info!(compile_version = compiled.compile_version, "规则已更新");
        Ok(compiled)
    }

    pub fn get_rule(&self, rule_id: &str) -> Result<Rule> {
        self.registry
            .get(rule_id)
            .map(|compiled| compiled.rule)
            .ok_or_else(|| RuleError::RuleNotFound(rule_id.to_string()))
    }

    /// 分页列出规则（页码从 1 开始）
    pub fn list_rules(&self, page: usize, limit: usize) -> Result<RulePage> {
        self.registry.fetch(page, limit)
    }

    /// 使用缓存的语法树评估规则
    #[instrument(skip(self, record), fields(fields = record.len()))]
    pub fn evaluate(&self, rule_id: &str, record: &Record) -> Result<EvaluationResult> {
        let compiled = self
            .registry
            .get(rule_id)
            .ok_or_else(|| RuleError::RuleNotFound(rule_id.to_string()))?;

        match self.executor.execute(&compiled, record) {
            Ok(result) => {
                debug!(
                    matched = result.result,
                    elapsed_ms = result.evaluation_time_ms,
                    "规则评估完成"
                );
                Ok(result)
            }
            Err(e) => {
                warn!(error = %e, "规则评估失败");
                Err(e.into())
            }
        }
    }

    /// 组合多条已有规则并保存为新规则
    #[instrument(skip(self, request), fields(operator = %request.operator, count = request.rule_ids.len()))]
    pub fn combine(&self, request: CombineRules) -> Result<CompiledRule> {
        if request.rule_ids.len() < 2 {
            return Err(CombineError::InsufficientRules {
                count: request.rule_ids.len(),
            }
            .into());
        }

        let name = validated_name(&request.name)?;

        let sources: Vec<Rule> = self
            .registry
            .get_many(&request.rule_ids)?
            .into_iter()
            .map(|compiled| compiled.rule)
            .collect();

        let expression = RuleCombiner::combine(&sources, request.operator)?;

        let rule = Rule::new(name, request.description, expression.to_canonical())
            .with_parents(request.rule_ids);
        let compiled = self.registry.insert(rule)?;

        info!(rule_id = %compiled.id(), "组合规则已创建");
        Ok(compiled)
    }
}

fn validated_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RuleError::InvalidRule("规则名称不能为空".to_string()));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::RuleCompiler;
    use crate::error::{EvalError, SyntaxError};
    use crate::operators::LogicalOperator;
    use crate::store::MockRuleRegistry;

    fn compiled(rule: Rule) -> crate::compiler::CompiledRule {
        RuleCompiler::new().compile(rule).unwrap()
    }

    fn stored_rule(id: &str, rule_string: &str) -> Rule {
        let mut rule = Rule::new(format!("rule {}", id), "", rule_string);
        rule.id = id.to_string();
        rule
    }

    #[test]
    fn test_create_rule_stores_canonical_text() {
        let mut registry = MockRuleRegistry::new();
        registry
            .expect_insert()
            .withf(|rule| rule.rule_string == "age > 30 AND department = 'Sales'")
            .times(1)
            .returning(|rule| Ok(compiled(rule)));

        let service = RuleService::new(Arc::new(registry));
        let rule = service
            .create_rule(NewRule::new(
                "  senior sales ",
                "desc",
                "age>30   AND department='Sales'",
            ))
            .unwrap()
            .rule;

        assert_eq!(rule.name, "senior sales");
        assert!(!rule.id.is_empty());
        assert!(rule.parent_rules.is_empty());
    }

    #[test]
    fn test_create_rule_rejects_invalid_input() {
        let mut registry = MockRuleRegistry::new();
        registry.expect_insert().never();
        let service = RuleService::new(Arc::new(registry));

        let err = service
            .create_rule(NewRule::new("name", "", "age > 30 AND dept = 'x' OR b = 1"))
            .unwrap_err();
        assert_eq!(err.code(), "RULE_PARSE_ERROR");

        let err = service
            .create_rule(NewRule::new("   ", "", "age > 30"))
            .unwrap_err();
        assert!(matches!(err, RuleError::InvalidRule(_)));
    }

    #[test]
    fn test_update_rule_keeps_identity() {
        let existing = stored_rule("rule-1", "age > 30").with_parents(vec!["p".to_string()]);
        let created_at = existing.created_at;

        let mut registry = MockRuleRegistry::new();
        let found = compiled(existing);
        registry
            .expect_get()
            .withf(|id| id == "rule-1")
            .returning(move |_| Some(found.clone()));
        registry
            .expect_replace()
            .times(1)
            .returning(|rule| Ok(compiled(rule)));

        let service = RuleService::new(Arc::new(registry));
        let updated = service
            .update_rule("rule-1", NewRule::new("renamed", "", "salary >= 100"))
            .unwrap()
            .rule;

        assert_eq!(updated.id, "rule-1");
        assert_eq!(updated.name, "renamed");
        assert_eq!(updated.rule_string, "salary >= 100");
        assert_eq!(updated.created_at, created_at);
        assert_eq!(updated.parent_rules, vec!["p".to_string()]);
        assert!(updated.updated_at >= created_at);
    }

    #[test]
    fn test_update_missing_rule() {
        let mut registry = MockRuleRegistry::new();
        registry.expect_get().returning(|_| None);
        registry.expect_replace().never();

        let service = RuleService::new(Arc::new(registry));
        let err = service
            .update_rule("missing", NewRule::new("n", "", "a = 1"))
            .unwrap_err();
        assert!(matches!(err, RuleError::RuleNotFound(id) if id == "missing"));
    }

    #[test]
    fn test_evaluate_uses_stored_rule() {
        let mut registry = MockRuleRegistry::new();
        let found = compiled(stored_rule("rule-1", "age > 30 AND department = 'Sales'"));
        registry
            .expect_get()
            .returning(move |_| Some(found.clone()));

        let service = RuleService::new(Arc::new(registry));

        let record = Record::new().with("age", 40).with("department", "Sales");
        let result = service.evaluate("rule-1", &record).unwrap();
        assert!(result.result);
        assert_eq!(result.rule_name, "rule rule-1");

        let record = Record::new().with("age", 40);
        let err = service.evaluate("rule-1", &record).unwrap_err();
        assert!(matches!(
            err,
            RuleError::Evaluation(EvalError::MissingField { .. })
        ));
    }

    #[test]
    fn test_combine_checks_count_before_lookup() {
        let mut registry = MockRuleRegistry::new();
        registry.expect_get_many().never();
        registry.expect_insert().never();

        let service = RuleService::new(Arc::new(registry));
        let err = service
            .combine(CombineRules {
                rule_ids: vec!["only".to_string()],
                name: "combo".to_string(),
                description: String::new(),
                operator: LogicalOperator::And,
            })
            .unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_RULES");
    }

    #[test]
    fn test_combine_persists_composite() {
        let mut registry = MockRuleRegistry::new();
        let sources = vec![
            compiled(stored_rule("a", "age > 30")),
            compiled(stored_rule("b", "department = 'Sales'")),
        ];
        registry
            .expect_get_many()
            .withf(|ids| ids == ["a".to_string(), "b".to_string()])
            .returning(move |_| Ok(sources.clone()));
        registry
            .expect_insert()
            .withf(|rule| rule.parent_rules == ["a".to_string(), "b".to_string()])
            .returning(|rule| Ok(compiled(rule)));

        let service = RuleService::new(Arc::new(registry));
        let combined = service
            .combine(CombineRules {
                rule_ids: vec!["a".to_string(), "b".to_string()],
                name: "combo".to_string(),
                description: "either".to_string(),
                operator: LogicalOperator::Or,
            })
            .unwrap();

        assert_eq!(combined.rule.rule_string, "(age > 30) OR (department = 'Sales')");
        assert_eq!(combined.rule.description, "either");
        assert_eq!(combined.expression().connector(), Some(LogicalOperator::Or));
        assert_eq!(combined.expression().depth(), 1);
    }

    #[test]
    fn test_combine_missing_source() {
        let mut registry = MockRuleRegistry::new();
        registry
            .expect_get_many()
            .returning(|_| Err(RuleError::RuleNotFound("b".to_string())));
        registry.expect_insert().never();

        let service = RuleService::new(Arc::new(registry));
        let err = service
            .combine(CombineRules {
                rule_ids: vec!["a".to_string(), "b".to_string()],
                name: "combo".to_string(),
                description: String::new(),
                operator: LogicalOperator::And,
            })
            .unwrap_err();
        assert!(matches!(err, RuleError::RuleNotFound(id) if id == "b"));
    }

    #[test]
    fn test_validate_rule_string() {
        let service = RuleService::new(Arc::new(MockRuleRegistry::new()));
        assert_eq!(
            service.validate_rule_string("a>=1 OR b!='x'").unwrap(),
            "a >= 1 OR b != 'x'"
        );
        assert!(matches!(
            service.validate_rule_string("a = 'x"),
            Err(RuleError::Syntax(SyntaxError::Lex(_)))
        ));
    }
}
