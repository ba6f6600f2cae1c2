//! 应用状态定义

use rule_engine::{RuleService, RuleStore};
use rule_shared::config::RulesConfig;
use std::sync::Arc;

/// Axum 应用共享状态
///
/// 规则服务通过 Arc 在 handler 间共享，底层存储本身线程安全。
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RuleService<RuleStore>>,
    pub rules: RulesConfig,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(store: RuleStore, rules: RulesConfig) -> Self {
        let service = RuleService::new(Arc::new(store));
        let service = if rules.trace_evaluations {
            service.with_trace()
        } else {
            service
        };

        Self {
            service: Arc::new(service),
            rules,
        }
    }

    pub fn store(&self) -> &RuleStore {
        self.service.registry()
    }

    /// 解析分页大小：未指定时取默认值，超过上限时截断
    pub fn page_limit(&self, limit: Option<usize>) -> usize {
        limit
            .unwrap_or(self.rules.default_page_size)
            .min(self.rules.max_page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_limit() {
        let state = AppState::new(RuleStore::new(), RulesConfig::default());
        assert_eq!(state.page_limit(None), 10);
        assert_eq!(state.page_limit(Some(25)), 25);
        assert_eq!(state.page_limit(Some(500)), 100);
        // 0 交给服务层校验
        assert_eq!(state.page_limit(Some(0)), 0);
    }

    #[test]
    fn test_state_shares_store() {
        let state = AppState::new(RuleStore::new(), RulesConfig::default());
        let cloned = state.clone();
        state
            .service
            .create_rule(rule_engine::NewRule::new("r", "", "age > 1"))
            .unwrap();
        assert_eq!(cloned.store().len(), 1);
    }
}
