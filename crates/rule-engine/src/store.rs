//! 规则存储管理
//!
//! 使用 DashMap 提供线程安全的规则缓存，规则以编译后的形式保存，
//! 评估时直接使用缓存的语法树。更新规则会重新编译并替换缓存。

use crate::compiler::{CompiledRule, RuleCompiler};
use crate::error::{Result, RuleError};
use crate::models::{Rule, RulePage};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// 规则注册表
///
/// 服务层通过该 trait 访问规则的持久化和查询。
#[cfg_attr(test, mockall::automock)]
pub trait RuleRegistry: Send + Sync {
    /// 编译并保存新规则
    fn insert(&self, rule: Rule) -> Result<CompiledRule>;

    /// 替换已有规则，不存在时返回 `RuleNotFound`
    fn replace(&self, rule: Rule) -> Result<CompiledRule>;

    fn get(&self, rule_id: &str) -> Option<CompiledRule>;

    /// 按顺序批量获取，任一 ID 不存在即失败
    fn get_many(&self, rule_ids: &[String]) -> Result<Vec<CompiledRule>>;

    /// 分页查询（页码从 1 开始）
    fn fetch(&self, page: usize, limit: usize) -> Result<RulePage>;
}

/// 规则存储
#[derive(Clone)]
pub struct RuleStore {
    /// 编译后的规则缓存
    rules: Arc<DashMap<String, CompiledRule>>,
    /// 规则编译器
    compiler: Arc<parking_lot::Mutex<RuleCompiler>>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self {
            rules: Arc::new(DashMap::new()),
            compiler: Arc::new(parking_lot::Mutex::new(RuleCompiler::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 编译并加载规则，同 ID 的规则会被覆盖
    #[instrument(skip(self, rule), fields(rule_id = %rule.id, rule_name = %rule.name))]
    pub fn load(&self, rule: Rule) -> Result<CompiledRule> {
        let compiled = {
            let mut compiler = self.compiler.lock();
            compiler.compile(rule)?
        };

        self.rules
            .insert(compiled.id().to_string(), compiled.clone());

        info!(compile_version = compiled.compile_version, "规则已加载");
        Ok(compiled)
    }

    /// 更新规则
    #[instrument(skip(self, rule), fields(rule_id = %rule.id))]
    pub fn update(&self, rule: Rule) -> Result<CompiledRule> {
        if !self.rules.contains_key(&rule.id) {
            warn!("更新不存在的规则");
            return Err(RuleError::RuleNotFound(rule.id));
        }

        self.load(rule)
    }

    pub fn get(&self, rule_id: &str) -> Option<CompiledRule> {
        self.rules.get(rule_id).map(|r| r.clone())
    }

    /// 分页查询，按创建时间排序，时间相同时按 ID 排序
    #[instrument(skip(self))]
    pub fn fetch(&self, page: usize, limit: usize) -> Result<RulePage> {
        if page == 0 || limit == 0 {
            return Err(RuleError::InvalidPagination { page, limit });
        }

        let mut rules: Vec<Rule> = self.rules.iter().map(|r| r.rule.clone()).collect();
        rules.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        let total = rules.len();
        let rules: Vec<Rule> = rules
            .into_iter()
            .skip((page - 1).saturating_mul(limit))
            .take(limit)
            .collect();

        debug!(total, returned = rules.len(), "分页查询完成");

        Ok(RulePage {
            rules,
            total,
            page,
            limit,
            pages: total.div_ceil(limit),
        })
    }

    /// 获取规则统计信息
    pub fn stats(&self) -> RuleStoreStats {
        let rules_count = self.rules.len();
        let total_fields: usize = self
            .rules
            .iter()
            .map(|r| r.required_fields.len())
            .sum();
        let combined_rules = self
            .rules
            .iter()
            .filter(|r| !r.rule.parent_rules.is_empty())
            .count();

        RuleStoreStats {
            rules_count,
            combined_rules,
            total_fields,
            avg_fields_per_rule: if rules_count > 0 {
                total_fields as f64 / rules_count as f64
            } else {
                0.0
            },
        }
    }
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleRegistry for RuleStore {
    fn insert(&self, rule: Rule) -> Result<CompiledRule> {
        self.load(rule)
    }

    fn replace(&self, rule: Rule) -> Result<CompiledRule> {
        self.update(rule)
    }

    fn get(&self, rule_id: &str) -> Option<CompiledRule> {
        RuleStore::get(self, rule_id)
    }

    fn get_many(&self, rule_ids: &[String]) -> Result<Vec<CompiledRule>> {
        rule_ids
            .iter()
            .map(|id| {
                RuleStore::get(self, id).ok_or_else(|| RuleError::RuleNotFound(id.clone()))
            })
            .collect()
    }

    fn fetch(&self, page: usize, limit: usize) -> Result<RulePage> {
        RuleStore::fetch(self, page, limit)
    }
}

/// 规则存储统计信息
#[derive(Debug, Clone, Serialize)]
pub struct RuleStoreStats {
    /// 规则总数
    pub rules_count: usize,
    /// 由组合产生的规则数
    pub combined_rules: usize,
    /// 所有规则引用的字段总数
    pub total_fields: usize,
    /// 平均每条规则引用的字段数
    pub avg_fields_per_rule: f64,
}
