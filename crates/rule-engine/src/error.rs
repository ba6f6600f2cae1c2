//! 规则引擎错误类型
//!
//! 词法、语法、类型转换、求值与组合各自拥有独立的错误枚举，
//! 便于调用方区分失败原因；`RuleError` 汇总服务层的全部失败。

use crate::models::ValueKind;
use crate::operators::{LogicalOperator, Operator};
use thiserror::Error;

/// 词法错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("词法错误 (位置 {position}): {reason}")]
pub struct LexError {
    /// 出错位置（字节偏移）
    pub position: usize,
    pub reason: LexErrorReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexErrorReason {
    #[error("字符串字面量未闭合")]
    UnterminatedString,

    #[error("无法识别的字符 '{0}'")]
    UnexpectedChar(char),

    #[error("数字格式错误: {0}")]
    MalformedNumber(String),
}

/// 语法错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("规则表达式为空")]
    EmptyExpression,

    #[error("位置 {position}: 期望 {expected}, 实际为 {found}")]
    UnexpectedToken {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("位置 {position}: 同一表达式中连接符必须一致, 已使用 {expected}, 出现 {found}")]
    MixedConnectors {
        position: usize,
        expected: LogicalOperator,
        found: LogicalOperator,
    },

    #[error("位置 {position}: 括号嵌套超过 {max} 层")]
    NestingTooDeep { position: usize, max: usize },
}

/// 规则文本无法解析（词法或语法阶段）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// 字段值与字面量无法比较
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    #[error("操作符 {operator} 需要数值, 实际为 {actual}")]
    NotNumeric {
        operator: Operator,
        actual: ValueKind,
    },

    #[error("类型不匹配: 字段值为 {field}, 字面量为 {literal}")]
    TypeMismatch { field: ValueKind, literal: ValueKind },

    #[error("操作符 {operator} 不支持类型 {kind}")]
    UnsupportedOperator { operator: Operator, kind: ValueKind },
}

/// 求值错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("字段不存在: {field}")]
    MissingField { field: String },

    #[error("字段 {field} 比较失败: {source}")]
    Coercion {
        field: String,
        #[source]
        source: CoercionError,
    },
}

/// 规则组合错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombineError {
    #[error("组合至少需要 2 条规则, 实际 {count} 条")]
    InsufficientRules { count: usize },

    #[error("组合结果嵌套 {depth} 层, 超过上限 {max} 层")]
    NestingTooDeep { depth: usize, max: usize },

    #[error("源规则 {rule_id} 无法解析: {source}")]
    InvalidSourceRule {
        rule_id: String,
        #[source]
        source: SyntaxError,
    },
}

/// 输入记录无法转换
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("记录必须是 JSON 对象, 实际为 {0}")]
    NotAnObject(&'static str),

    #[error("字段 {field} 的值类型 {kind} 不受支持")]
    UnsupportedValue { field: String, kind: &'static str },
}

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("规则解析失败: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("记录无效: {0}")]
    Record(#[from] RecordError),

    #[error("规则执行失败: {0}")]
    Evaluation(#[from] EvalError),

    #[error("规则组合失败: {0}")]
    Combine(#[from] CombineError),

    #[error("规则无效: {0}")]
    InvalidRule(String),

    #[error("规则未找到: {0}")]
    RuleNotFound(String),

    #[error("分页参数无效: page={page}, limit={limit}")]
    InvalidPagination { page: usize, limit: usize },
}

impl RuleError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Syntax(SyntaxError::Lex(_)) => "RULE_LEX_ERROR",
            Self::Syntax(SyntaxError::Parse(_)) => "RULE_PARSE_ERROR",
            Self::Record(_) => "INVALID_RECORD",
            Self::Evaluation(EvalError::MissingField { .. }) => "MISSING_FIELD",
            Self::Evaluation(EvalError::Coercion { .. }) => "TYPE_COERCION_ERROR",
            Self::Combine(CombineError::InsufficientRules { .. }) => "INSUFFICIENT_RULES",
            Self::Combine(CombineError::InvalidSourceRule { .. }) => "INVALID_SOURCE_RULE",
            Self::Combine(CombineError::NestingTooDeep { .. }) => "NESTING_TOO_DEEP",
            Self::InvalidRule(_) => "INVALID_RULE",
            Self::RuleNotFound(_) => "RULE_NOT_FOUND",
            Self::InvalidPagination { .. } => "INVALID_PAGINATION",
        }
    }
}

impl From<LexError> for RuleError {
    fn from(err: LexError) -> Self {
        Self::Syntax(err.into())
    }
}

impl From<ParseError> for RuleError {
    fn from(err: ParseError) -> Self {
        Self::Syntax(err.into())
    }
}

pub type Result<T> = std::result::Result<T, RuleError>;
