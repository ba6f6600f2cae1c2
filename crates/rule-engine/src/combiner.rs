//! 规则组合器
//!
//! 把多条已有规则作为不透明的整体，用同一个连接符连接成新表达式。
//! 每条源规则成为一个括号分组，不展开、不合并其内部条件。
//! 组合结果的嵌套层数不得超过解析器能接受的上限。

use crate::ast::{Expression, MAX_NESTING_DEPTH, Term};
use crate::error::CombineError;
use crate::models::Rule;
use crate::operators::LogicalOperator;
use crate::parser::parse_rule;

pub struct RuleCombiner;

impl RuleCombiner {
    /// 重新解析每条源规则并组合
    pub fn combine(
        rules: &[Rule],
        connector: LogicalOperator,
    ) -> Result<Expression, CombineError> {
        Self::ensure_enough(rules.len())?;

        let expressions = rules
            .iter()
            .map(|rule| {
                parse_rule(&rule.rule_string).map_err(|source| CombineError::InvalidSourceRule {
                    rule_id: rule.id.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::combine_expressions(expressions, connector)
    }

    /// 组合已解析的表达式
    pub fn combine_expressions(
        expressions: Vec<Expression>,
        connector: LogicalOperator,
    ) -> Result<Expression, CombineError> {
        Self::ensure_enough(expressions.len())?;

        let groups = expressions.into_iter().map(Term::from).collect();
        let combined = Expression::from_parts(Some(connector), groups);

        let depth = combined.depth();
        if depth > MAX_NESTING_DEPTH {
            return Err(CombineError::NestingTooDeep {
                depth,
                max: MAX_NESTING_DEPTH,
            });
        }
        Ok(combined)
    }

    fn ensure_enough(count: usize) -> Result<(), CombineError> {
        if count < 2 {
            return Err(CombineError::InsufficientRules { count });
        }
        Ok(())
    }
}

/// 组合多条规则
pub fn combine(rules: &[Rule], connector: LogicalOperator) -> Result<Expression, CombineError> {
    RuleCombiner::combine(rules, connector)
}
