//! 规则操作符定义

use serde::{Deserialize, Serialize};
use std::fmt;

/// 比较操作符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "!=")]
    Neq,
}

impl Operator {
    /// 规范文本中的符号
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Eq => "=",
            Self::Gte => ">=",
            Self::Lte => "<=",
            Self::Neq => "!=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// 逻辑连接符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    /// 按关键字识别连接符（区分大小写）
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            _ => None,
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_serde_uses_symbols() {
        assert_eq!(serde_json::to_string(&Operator::Gte).unwrap(), "\">=\"");
        let op: Operator = serde_json::from_str("\"!=\"").unwrap();
        assert_eq!(op, Operator::Neq);
    }

    #[test]
    fn test_connector_keywords_are_case_sensitive() {
        assert_eq!(LogicalOperator::from_keyword("AND"), Some(LogicalOperator::And));
        assert_eq!(LogicalOperator::from_keyword("OR"), Some(LogicalOperator::Or));
        assert_eq!(LogicalOperator::from_keyword("and"), None);
        assert_eq!(LogicalOperator::Or.to_string(), "OR");
    }
}
