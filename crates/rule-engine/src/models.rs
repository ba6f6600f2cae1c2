//! 规则引擎领域模型

use crate::error::RecordError;
use crate::operators::LogicalOperator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// 规则定义
///
/// `rule_string` 始终是可解析的规范文本，创建和更新前都必须通过语法校验。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub rule_string: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    /// 组合规则的来源规则 ID，直接编写的规则为空
    #[serde(default)]
    pub parent_rules: Vec<String>,
}

impl Rule {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        rule_string: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            description: description.into(),
            rule_string: rule_string.into(),
            created_at: now,
            updated_at: now,
            parent_rules: Vec::new(),
        }
    }

    pub fn with_parents(mut self, parent_rules: Vec<String>) -> Self {
        self.parent_rules = parent_rules;
        self
    }
}

/// 创建或整体更新规则时提交的字段
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewRule {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub rule_string: String,
}

impl NewRule {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        rule_string: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            rule_string: rule_string.into(),
        }
    }
}

/// 组合多条已有规则的请求
#[derive(Debug, Clone, Deserialize)]
pub struct CombineRules {
    pub rule_ids: Vec<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub operator: LogicalOperator,
}

/// 可比较值的类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Number,
    String,
    Boolean,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number => write!(f, "number"),
            Self::String => write!(f, "string"),
            Self::Boolean => write!(f, "boolean"),
        }
    }
}

/// 记录中的字段值
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RecordValue {
    Number(f64),
    String(String),
    Boolean(bool),
}

impl RecordValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Number(_) => ValueKind::Number,
            Self::String(_) => ValueKind::String,
            Self::Boolean(_) => ValueKind::Boolean,
        }
    }

    /// 从 JSON 值转换，null/数组/对象直接拒绝
    pub fn from_json(field: &str, value: &Value) -> std::result::Result<Self, RecordError> {
        match value {
            Value::Number(n) => n.as_f64().map(Self::Number).ok_or_else(|| {
                RecordError::UnsupportedValue {
                    field: field.to_string(),
                    kind: "number",
                }
            }),
            Value::String(s) => Ok(Self::String(s.clone())),
            Value::Bool(b) => Ok(Self::Boolean(*b)),
            other => Err(RecordError::UnsupportedValue {
                field: field.to_string(),
                kind: json_type_name(other),
            }),
        }
    }
}

impl From<f64> for RecordValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for RecordValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<i32> for RecordValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for RecordValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for RecordValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for RecordValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

/// 待评估的记录：字段名到值的映射
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    fields: HashMap<String, RecordValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// 链式添加字段
    pub fn with(mut self, field: impl Into<String>, value: impl Into<RecordValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<RecordValue>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&RecordValue> {
        self.fields.get(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 从 JSON 对象创建，任一字段类型不受支持即失败
    pub fn from_json(value: &Value) -> std::result::Result<Self, RecordError> {
        let map = value
            .as_object()
            .ok_or_else(|| RecordError::NotAnObject(json_type_name(value)))?;

        let fields = map
            .iter()
            .map(|(field, value)| Ok((field.clone(), RecordValue::from_json(field, value)?)))
            .collect::<std::result::Result<HashMap<_, _>, RecordError>>()?;

        Ok(Self { fields })
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<RecordValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (field, value) in iter {
            record.insert(field, value);
        }
        record
    }
}

/// 评估结果
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    pub rule_id: String,
    pub rule_name: String,
    pub rule_string: String,
    pub result: bool,
    pub matched_conditions: Vec<String>,
    pub evaluation_trace: Vec<String>,
    /// 评估耗时（毫秒，含小数部分）
    pub evaluation_time_ms: f64,
}

impl EvaluationResult {
    pub fn new(rule_id: String, rule_name: String, rule_string: String) -> Self {
        Self {
            rule_id,
            rule_name,
            rule_string,
            result: false,
            matched_conditions: Vec::new(),
            evaluation_trace: Vec::new(),
            evaluation_time_ms: 0.0,
        }
    }
}

/// 分页查询结果
#[derive(Debug, Clone, Serialize)]
pub struct RulePage {
    pub rules: Vec<Rule>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub pages: usize,
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
