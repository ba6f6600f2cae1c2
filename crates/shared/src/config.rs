//! 配置管理模块
//!
//! 支持多层配置文件加载、环境变量覆盖，以及类型安全的配置访问。

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::observability::ObservabilityConfig;

/// 服务配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// 规则服务配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// 分页查询未指定 limit 时的默认值
    pub default_page_size: usize,
    /// 单页最多返回的规则数
    pub max_page_size: usize,
    /// 评估结果是否附带追踪信息
    pub trace_evaluations: bool,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
            trace_evaluations: false,
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub server: ServerConfig,
    pub observability: ObservabilityConfig,
    pub rules: RulesConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml（默认配置）
    /// 2. config/{environment}.toml（环境特定配置）
    /// 3. config/{service_name}.toml（服务特定配置）
    /// 4. 环境变量（RULE_ 前缀，层级用双下划线，如 RULE_SERVER__PORT -> server.port）
    /// 5. 服务特定端口环境变量（如 RULE_ADMIN_PORT）
    ///
    /// 配置目录默认为 `config`，可通过 CONFIG_DIR 覆盖；环境名来自 RULE_ENV。
    pub fn load(service_name: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("RULE_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        let mut config = Self::load_from(Path::new(&config_dir), service_name, &env)?;

        // 服务特定端口环境变量覆盖
        if let Some(port) = Self::get_service_port_from_env(service_name) {
            config.server.port = port;
        }

        Ok(config)
    }

    /// 从指定目录加载配置
    pub fn load_from(config_dir: &Path, service_name: &str, env: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{}.toml", env))).required(false))
            .add_source(
                File::from(config_dir.join(format!("{}.toml", service_name))).required(false),
            )
            .add_source(
                Environment::with_prefix("RULE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// 从环境变量获取服务特定端口
    ///
    /// - rule-admin-service -> RULE_ADMIN_PORT
    /// - 其他服务名转换为大写下划线格式 + _PORT
    fn get_service_port_from_env(service_name: &str) -> Option<u16> {
        let env_var_name = match service_name {
            "rule-admin-service" => "RULE_ADMIN_PORT".to_string(),
            _ => Self::generic_port_var(service_name),
        };

        std::env::var(&env_var_name)
            .ok()
            .and_then(|v| v.parse().ok())
    }

    /// 将 "my-service-name" 转换为 "MY_SERVICE_NAME_PORT"
    fn generic_port_var(service_name: &str) -> String {
        format!("{}_PORT", service_name.to_uppercase().replace('-', "_"))
    }

    /// 获取服务地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 可观测性配置，服务名取自应用配置
    pub fn observability(&self) -> ObservabilityConfig {
        ObservabilityConfig {
            service_name: self.service_name.clone(),
            ..self.observability.clone()
        }
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
