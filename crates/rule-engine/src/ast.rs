//! 规则语法树
//!
//! 表达式是由同一个连接符串起的一组项，项可以是单个比较条件，
//! 也可以是括号包裹的子表达式（规则组合时产生）。
//! `Display` 输出规范文本，重新解析后得到相同的语法树。

use crate::models::ValueKind;
use crate::operators::{LogicalOperator, Operator};
use serde::Serialize;
use std::fmt;

/// 括号分组允许的最大嵌套层数
pub const MAX_NESTING_DEPTH: usize = 32;

/// 条件右侧的字面量，类型由词法形式决定
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Literal {
    Number(f64),
    String(String),
    Boolean(bool),
}

impl Literal {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Number(_) => ValueKind::Number,
            Self::String(_) => ValueKind::String,
            Self::Boolean(_) => ValueKind::Boolean,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::String(s) => write!(f, "'{}'", s),
            Self::Boolean(b) => write!(f, "{}", b),
        }
    }
}

/// 比较条件
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Condition {
    pub field: String,
    pub operator: Operator,
    pub value: Literal,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: Operator, value: Literal) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.operator, self.value)
    }
}

/// 表达式中的一项
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Term {
    Condition(Condition),
    Group(Box<Expression>),
}

impl From<Condition> for Term {
    fn from(condition: Condition) -> Self {
        Self::Condition(condition)
    }
}

impl From<Expression> for Term {
    fn from(expression: Expression) -> Self {
        Self::Group(Box::new(expression))
    }
}

/// 表达式
///
/// 不变量：至少一项；N 项对应 N-1 个相同的连接符，单项时没有连接符。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expression {
    connector: Option<LogicalOperator>,
    terms: Vec<Term>,
}

impl Expression {
    /// 单项表达式
    pub fn single(term: impl Into<Term>) -> Self {
        Self {
            connector: None,
            terms: vec![term.into()],
        }
    }

    /// 用同一个连接符串起若干项，`rest` 为空时退化为单项表达式
    pub fn join(
        connector: LogicalOperator,
        first: impl Into<Term>,
        rest: impl IntoIterator<Item = Term>,
    ) -> Self {
        let mut terms = vec![first.into()];
        terms.extend(rest);
        Self::from_parts(Some(connector), terms)
    }

    pub(crate) fn from_parts(connector: Option<LogicalOperator>, terms: Vec<Term>) -> Self {
        debug_assert!(!terms.is_empty(), "expression must contain at least one term");
        let connector = if terms.len() > 1 { connector } else { None };
        Self { connector, terms }
    }

    pub fn connector(&self) -> Option<LogicalOperator> {
        self.connector
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// 深度优先收集全部条件（含子表达式）
    pub fn conditions(&self) -> Vec<&Condition> {
        let mut out = Vec::new();
        self.collect_conditions(&mut out);
        out
    }

    fn collect_conditions<'a>(&'a self, out: &mut Vec<&'a Condition>) {
        for term in &self.terms {
            match term {
                Term::Condition(cond) => out.push(cond),
                Term::Group(group) => group.collect_conditions(out),
            }
        }
    }

    /// 括号分组的嵌套层数，不含分组时为 0
    pub fn depth(&self) -> usize {
        self.terms
            .iter()
            .map(|term| match term {
                Term::Condition(_) => 0,
                Term::Group(group) => group.depth() + 1,
            })
            .max()
            .unwrap_or(0)
    }

    /// 规范文本
    pub fn to_canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                if let Some(connector) = self.connector {
                    write!(f, " {} ", connector)?;
                }
            }
            match term {
                Term::Condition(cond) => write!(f, "{}", cond)?,
                Term::Group(group) => write!(f, "({})", group)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn age_over_30() -> Condition {
        Condition::new("age", Operator::Gt, Literal::Number(30.0))
    }

    fn in_sales() -> Condition {
        Condition::new("department", Operator::Eq, Literal::String("Sales".into()))
    }

    #[test]
    fn test_single_condition_display() {
        let expr = Expression::single(age_over_30());
        assert_eq!(expr.to_string(), "age > 30");
        assert_eq!(expr.connector(), None);
    }

    #[test]
    fn test_chain_display() {
        let expr = Expression::join(
            LogicalOperator::And,
            age_over_30(),
            [Term::from(in_sales())],
        );
        assert_eq!(expr.to_string(), "age > 30 AND department = 'Sales'");
        assert_eq!(expr.connector(), Some(LogicalOperator::And));
    }

    #[test]
    fn test_join_without_rest_drops_connector() {
        let expr = Expression::join(LogicalOperator::Or, age_over_30(), []);
        assert_eq!(expr.connector(), None);
        assert_eq!(expr.terms().len(), 1);
    }

    #[test]
    fn test_group_display() {
        let expr = Expression::join(
            LogicalOperator::Or,
            Expression::single(age_over_30()),
            [Term::from(Expression::single(in_sales()))],
        );
        assert_eq!(expr.to_string(), "(age > 30) OR (department = 'Sales')");
        assert_eq!(expr.conditions().len(), 2);
    }

    #[test]
    fn test_literal_display() {
        assert_eq!(Literal::Number(1.5).to_string(), "1.5");
        assert_eq!(Literal::Number(-20.0).to_string(), "-20");
        assert_eq!(Literal::Boolean(false).to_string(), "false");
        assert_eq!(Literal::String("a b".into()).to_string(), "'a b'");
    }

    #[test]
    fn test_depth() {
        let flat = Expression::join(LogicalOperator::And, age_over_30(), [Term::from(in_sales())]);
        assert_eq!(flat.depth(), 0);

        let grouped = Expression::join(
            LogicalOperator::Or,
            flat.clone(),
            [Term::from(Expression::single(Expression::single(in_sales())))],
        );
        assert_eq!(grouped.depth(), 2);
    }
}
