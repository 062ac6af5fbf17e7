//! 配置管理

use crate::error::{ErrorContext, SmartFdxError, SmartFdxResult};
use crate::types::SmartFdxConfig;

use std::path::Path;

impl Default for SmartFdxConfig {
    fn default() -> Self {
        Self {
            credential_store: crate::types::CredentialStoreConfig {
                endpoint: String::new(),
                service_key: String::new(),
                users_table: "users".to_string(),
                routes_table: "workspace_routes".to_string(),
            },
            session: crate::types::SessionConfig {
                ttl_minutes: 480,
                storage_dir: None,
                sweep_interval_secs: 60,
            },
            routing: crate::types::RoutingConfig {
                default_route: "/demo".to_string(),
                login_path: "/login".to_string(),
            },
            logging: crate::logging::LoggingConfig::default(),
        }
    }
}

impl SmartFdxConfig {
    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> SmartFdxResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SmartFdxError::Config {
            message: format!("Failed to read config file: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config")
                .with_operation("read_file")
                .with_suggestion("Check if the config file exists and is readable"),
        })?;

        let config: SmartFdxConfig = toml::from_str(&content).map_err(|e| SmartFdxError::Config {
            message: format!("Failed to parse config: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config")
                .with_operation("parse_toml")
                .with_suggestion("Check TOML syntax in config file"),
        })?;

        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> SmartFdxResult<()> {
        let content = toml::to_string_pretty(self).map_err(|e| SmartFdxError::Config {
            message: format!("Failed to serialize config: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config").with_operation("serialize_toml"),
        })?;

        std::fs::write(path, content).map_err(|e| SmartFdxError::Config {
            message: format!("Failed to write config file: {}", e),
            source: Some(Box::new(e)),
            context: crate::ErrorContext::new("config")
                .with_operation("write_file")
                .with_suggestion("Check if the directory exists and is writable"),
        })?;

        Ok(())
    }

    /// 验证配置
    pub fn validate(&self) -> SmartFdxResult<()> {
        if self.session.ttl_minutes <= 0 {
            return Err(SmartFdxError::Config {
                message: "Session ttl_minutes must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set session.ttl_minutes to a positive value"),
            });
        }

        if self.session.sweep_interval_secs == 0 {
            return Err(SmartFdxError::Config {
                message: "Session sweep_interval_secs must be greater than 0".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Set session.sweep_interval_secs to a positive value"),
            });
        }

        if !self.routing.default_route.starts_with('/') {
            return Err(SmartFdxError::Config {
                message: "Routing default_route must be an absolute path".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Use a path starting with '/', e.g. \"/demo\""),
            });
        }

        if !self.routing.login_path.starts_with('/') {
            return Err(SmartFdxError::Config {
                message: "Routing login_path must be an absolute path".to_string(),
                source: None,
                context: ErrorContext::new("config")
                    .with_operation("validate")
                    .with_suggestion("Use a path starting with '/', e.g. \"/login\""),
            });
        }

        Ok(())
    }
}
