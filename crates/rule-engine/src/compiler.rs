//! 规则编译器
//!
//! 校验规则并解析规则文本，缓存语法树和字段集合，评估时无需重复解析。

use crate::ast::Expression;
use crate::error::{Result, RuleError};
use crate::models::Rule;
use crate::parser::parse_rule;
use std::collections::HashSet;

/// 编译后的规则
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// 原始规则
    pub rule: Rule,
    /// 解析后的语法树
    pub expression: Expression,
    /// 规则中引用的全部字段名
    pub required_fields: HashSet<String>,
    /// 编译版本号（用于缓存失效）
    pub compile_version: u64,
}

impl CompiledRule {
    pub fn id(&self) -> &str {
        &self.rule.id
    }

    pub fn name(&self) -> &str {
        &self.rule.name
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }
}

/// 规则编译器
pub struct RuleCompiler {
    compile_version: u64,
}

impl RuleCompiler {
    pub fn new() -> Self {
        Self { compile_version: 0 }
    }

    /// 编译规则
    pub fn compile(&mut self, rule: Rule) -> Result<CompiledRule> {
        self.validate_rule(&rule)?;

        let expression = parse_rule(&rule.rule_string)?;
        let required_fields = expression
            .conditions()
            .into_iter()
            .map(|cond| cond.field.clone())
            .collect();

        self.compile_version += 1;

        Ok(CompiledRule {
            rule,
            expression,
            required_fields,
            compile_version: self.compile_version,
        })
    }

    fn validate_rule(&self, rule: &Rule) -> Result<()> {
        if rule.id.is_empty() {
            return Err(RuleError::InvalidRule("规则 ID 不能为空".to_string()));
        }

        if rule.name.trim().is_empty() {
            return Err(RuleError::InvalidRule("规则名称不能为空".to_string()));
        }

        Ok(())
    }
}

impl Default for RuleCompiler {
    fn default() -> Self {
        Self::new()
    }
}
