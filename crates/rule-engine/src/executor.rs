//! 规则执行器
//!
//! 按从左到右的顺序对语法树短路求值，返回匹配结果和评估追踪信息。
//! 字段缺失与类型错误都是硬错误；短路点之后的条件不会被求值，
//! 其错误也不会出现。

use crate::ast::{Condition, Expression, Term};
use crate::compiler::CompiledRule;
use crate::error::EvalError;
use crate::evaluator::ConditionEvaluator;
use crate::models::{EvaluationResult, Record};
use crate::operators::LogicalOperator;
use std::time::Instant;

/// 求值过程中收集的匹配条件和追踪信息
#[derive(Default)]
struct Collector {
    matched_conditions: Vec<String>,
    trace: Vec<String>,
}

/// 规则执行器
pub struct RuleExecutor {
    /// 是否记录详细评估追踪
    trace_enabled: bool,
}

impl RuleExecutor {
    pub fn new() -> Self {
        Self {
            trace_enabled: false,
        }
    }

    /// 启用评估追踪
    pub fn with_trace(mut self) -> Self {
        self.trace_enabled = true;
        self
    }

    /// 对表达式求值
    pub fn evaluate(&self, expr: &Expression, record: &Record) -> Result<bool, EvalError> {
        let mut collector = Collector::default();
        self.evaluate_expression(expr, record, &mut collector, "root")
    }

    /// 执行编译后的规则
    pub fn execute(
        &self,
        rule: &CompiledRule,
        record: &Record,
    ) -> Result<EvaluationResult, EvalError> {
        let start = Instant::now();

        let mut result = EvaluationResult::new(
            rule.id().to_string(),
            rule.name().to_string(),
            rule.rule.rule_string.clone(),
        );

        let mut collector = Collector::default();
        let matched = self.evaluate_expression(rule.expression(), record, &mut collector, "root")?;

        result.result = matched;
        result.matched_conditions = collector.matched_conditions;
        result.evaluation_trace = collector.trace;
        result.evaluation_time_ms = start.elapsed().as_secs_f64() * 1000.0;

        Ok(result)
    }

    fn evaluate_term(
        &self,
        term: &Term,
        record: &Record,
        out: &mut Collector,
        path: &str,
    ) -> Result<bool, EvalError> {
        match term {
            Term::Condition(cond) => self.evaluate_condition(cond, record, out, path),
            Term::Group(group) => self.evaluate_expression(group, record, out, path),
        }
    }

    fn evaluate_condition(
        &self,
        cond: &Condition,
        record: &Record,
        out: &mut Collector,
        path: &str,
    ) -> Result<bool, EvalError> {
        let field_value = record
            .get(&cond.field)
            .ok_or_else(|| EvalError::MissingField {
                field: cond.field.clone(),
            })?;

        let matched = ConditionEvaluator::compare(field_value, cond.operator, &cond.value)
            .map_err(|source| EvalError::Coercion {
                field: cond.field.clone(),
                source,
            })?;

        if self.trace_enabled {
            out.trace.push(format!(
                "{}: {} => {}",
                path,
                cond,
                if matched { "MATCHED" } else { "NOT_MATCHED" }
            ));
        }

        if matched {
            out.matched_conditions.push(cond.to_string());
        }

        Ok(matched)
    }

    /// 评估表达式（短路求值）
    ///
    /// 单项表达式没有连接符，按 AND 处理。
    fn evaluate_expression(
        &self,
        expr: &Expression,
        record: &Record,
        out: &mut Collector,
        path: &str,
    ) -> Result<bool, EvalError> {
        let terms = expr.terms();
        let connector = expr.connector().unwrap_or(LogicalOperator::And);

        if self.trace_enabled && terms.len() > 1 {
            out.trace.push(format!(
                "{}: 开始评估 {} 组 (共 {} 项)",
                path,
                connector,
                terms.len()
            ));
        }

        // AND 遇到 false 停止，OR 遇到 true 停止
        let stop_on = connector == LogicalOperator::Or;

        for (i, term) in terms.iter().enumerate() {
            let term_path = format!("{}.terms[{}]", path, i);
            let matched = self.evaluate_term(term, record, out, &term_path)?;

            if matched == stop_on {
                if self.trace_enabled && i + 1 < terms.len() {
                    let verdict = if matched { "匹配" } else { "不匹配" };
                    out.trace.push(format!(
                        "{}: {} 短路 - 第 {} 项{}, 跳过剩余 {} 项",
                        path,
                        connector,
                        i,
                        verdict,
                        terms.len() - i - 1
                    ));
                }
                return Ok(stop_on);
            }
        }

        Ok(!stop_on)
    }
}

impl Default for RuleExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// 对表达式求值（不记录追踪）
pub fn evaluate(expr: &Expression, record: &Record) -> Result<bool, EvalError> {
    RuleExecutor::new().evaluate(expr, record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::RuleCompiler;
    use crate::error::CoercionError;
    use crate::models::Rule;
    use crate::parser::parse_rule;

    fn employee() -> Record {
        Record::new()
            .with("age", 35)
            .with("department", "Sales")
            .with("salary", 52000.0)
            .with("active", true)
    }

    fn compile_rule(rule_string: &str) -> CompiledRule {
        let mut compiler = RuleCompiler::new();
        compiler
            .compile(Rule::new("test", "", rule_string))
            .unwrap()
    }

    fn eval(rule_string: &str, record: &Record) -> Result<bool, EvalError> {
        evaluate(&parse_rule(rule_string).unwrap(), record)
    }

    #[test]
    fn test_simple_condition() {
        assert!(eval("age > 30", &employee()).unwrap());
        assert!(!eval("age > 40", &employee()).unwrap());
        assert!(eval("active = true", &employee()).unwrap());
    }

    #[test]
    fn test_and_chain() {
        assert!(eval("age > 30 AND department = 'Sales'", &employee()).unwrap());
        assert!(!eval("age > 30 AND department = 'HR'", &employee()).unwrap());
    }

    #[test]
    fn test_or_chain() {
        assert!(eval("age > 60 OR department = 'Sales'", &employee()).unwrap());
        assert!(!eval("age > 60 OR department = 'HR'", &employee()).unwrap());
    }

    #[test]
    fn test_nested_groups() {
        let record = employee();
        assert!(eval("(age > 60 OR salary >= 50000) AND department = 'Sales'", &record).unwrap());
        assert!(!eval("(age > 60 OR salary >= 90000) AND department = 'Sales'", &record).unwrap());
    }

    #[test]
    fn test_and_short_circuit_skips_missing_field() {
        assert!(!eval("age > 60 AND bonus > 1", &employee()).unwrap());
    }

    #[test]
    fn test_or_short_circuit_skips_missing_field() {
        assert!(eval("age > 30 OR bonus > 1", &employee()).unwrap());
    }

    #[test]
    fn test_error_before_short_circuit_surfaces() {
        let err = eval("bonus > 1 AND age > 60", &employee()).unwrap_err();
        assert_eq!(
            err,
            EvalError::MissingField {
                field: "bonus".to_string()
            }
        );

        let err = eval("age > 30 AND department > 1", &employee()).unwrap_err();
        assert!(matches!(
            err,
            EvalError::Coercion {
                ref field,
                source: CoercionError::NotNumeric { .. }
            } if field == "department"
        ));
    }

    #[test]
    fn test_execute_reports_matches() {
        let rule = compile_rule("age > 30 AND department = 'Sales'");
        let result = RuleExecutor::new().execute(&rule, &employee()).unwrap();

        assert!(result.result);
        assert_eq!(result.rule_name, "test");
        assert_eq!(result.rule_string, "age > 30 AND department = 'Sales'");
        assert_eq!(
            result.matched_conditions,
            vec!["age > 30".to_string(), "department = 'Sales'".to_string()]
        );
        assert!(result.evaluation_trace.is_empty());
    }

    #[test]
    fn test_execute_reports_sub_millisecond_time() {
        let rule = compile_rule("age > 30");
        let result = RuleExecutor::new().execute(&rule, &employee()).unwrap();

        assert!(result.evaluation_time_ms.is_finite());
        assert!(result.evaluation_time_ms >= 0.0);
        assert!(result.evaluation_time_ms < 1000.0);

        // 以浮点毫秒输出，不截断为整数
        let json = serde_json::to_value(&result).unwrap();
        assert!(json["evaluation_time_ms"].is_f64());
    }

    #[test]
    fn test_trace_records_short_circuit() {
        let rule = compile_rule("age > 60 AND department = 'Sales' AND salary > 1");
        let result = RuleExecutor::new()
            .with_trace()
            .execute(&rule, &employee())
            .unwrap();

        assert!(!result.result);
        assert!(result.matched_conditions.is_empty());
        assert_eq!(result.evaluation_trace.len(), 3);
        assert!(result.evaluation_trace[1].contains("NOT_MATCHED"));
        assert!(result.evaluation_trace[2].contains("短路"));
    }

    #[test]
    fn test_trace_single_condition() {
        let rule = compile_rule("age > 30");
        let result = RuleExecutor::new()
            .with_trace()
            .execute(&rule, &employee())
            .unwrap();

        assert_eq!(result.evaluation_trace, vec!["root.terms[0]: age > 30 => MATCHED"]);
    }

    #[test]
    fn test_evaluation_is_repeatable() {
        let expr = parse_rule("salary > 1000 OR age < 18").unwrap();
        let record = Record::new().with("age", 40);
        let first = evaluate(&expr, &record);
        let second = evaluate(&expr, &record);
        assert_eq!(first, second);
        assert!(first.is_err());
    }
}
