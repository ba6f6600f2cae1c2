//! 规则表达式引擎
//!
//! 解析并求值形如 `age > 30 AND department = 'Sales'` 的规则文本，支持：
//! - 词法与语法分析，错误带位置信息
//! - 严格类型的条件比较（不做隐式转换）
//! - 从左到右的短路求值与评估追踪
//! - 以括号分组组合已有规则
//! - 编译缓存与线程安全的规则存储

pub mod ast;
pub mod combiner;
pub mod compiler;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod lexer;
pub mod models;
pub mod operators;
pub mod parser;
pub mod service;
pub mod store;

pub use ast::{Condition, Expression, Literal, MAX_NESTING_DEPTH, Term};
pub use combiner::{RuleCombiner, combine};
pub use compiler::{CompiledRule, RuleCompiler};
pub use error::{
    CoercionError, CombineError, EvalError, LexError, LexErrorReason, ParseError, RecordError,
    Result, RuleError, SyntaxError,
};
pub use evaluator::ConditionEvaluator;
pub use executor::{RuleExecutor, evaluate};
pub use lexer::{Lexer, SpannedToken, Token, tokenize};
pub use models::{
    CombineRules, EvaluationResult, NewRule, Record, RecordValue, Rule, RulePage, ValueKind,
};
pub use operators::{LogicalOperator, Operator};
pub use parser::{Parser, parse, parse_rule};
pub use service::RuleService;
pub use store::{RuleRegistry, RuleStore, RuleStoreStats};
