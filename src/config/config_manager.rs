// ==========================================
// 库存补货决策系统 - 配置管理器
// ==========================================
// 职责: 从 config_kv 表加载流水线参数，缺省回退默认值
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::pipeline_config::{ConfigError, PipelineConfig, RetryPolicy};
use crate::db::open_sqlite_connection;
use crate::repository::error::RepositoryError;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, ConfigError> {
        let conn = open_sqlite_connection(db_path).map_err(RepositoryError::from)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, ConfigError> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&conn_guard).map_err(RepositoryError::from)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>, ConfigError> {
        self.conn
            .lock()
            .map_err(|e| ConfigError::Storage(RepositoryError::LockError(e.to_string())))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let conn = self.get_conn()?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(RepositoryError::from(e).into()),
        }
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )
        .map_err(RepositoryError::from)?;
        Ok(())
    }

    /// 读取并解析配置；缺失或格式错误时回退默认值
    fn get_parsed_or_default<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr + Copy + std::fmt::Display,
    {
        let raw = match self.get_global_config_value(key)? {
            Some(v) => v,
            None => return Ok(default),
        };

        match raw.trim().parse::<T>() {
            Ok(v) => Ok(v),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = %default,
                    "配置格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }

    fn get_bool_or_default(&self, key: &'static str, default: bool) -> Result<bool, ConfigError> {
        let raw = match self.get_global_config_value(key)? {
            Some(v) => v,
            None => return Ok(default),
        };

        match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "y" | "on" => Ok(true),
            "0" | "false" | "no" | "n" | "off" => Ok(false),
            _ => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default,
                    "布尔配置格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }

    /// 加载流水线参数（逐项覆写默认值，最后统一校验）
    pub fn load_pipeline_config(&self) -> Result<PipelineConfig, ConfigError> {
        let defaults = PipelineConfig::default();
        let retry_defaults = RetryPolicy::default();

        let config = PipelineConfig {
            revenue_share_a: self
                .get_parsed_or_default(config_keys::REVENUE_SHARE_A, defaults.revenue_share_a)?,
            revenue_share_b: self
                .get_parsed_or_default(config_keys::REVENUE_SHARE_B, defaults.revenue_share_b)?,
            long_lead_time_days: self.get_parsed_or_default(
                config_keys::LONG_LEAD_TIME_DAYS,
                defaults.long_lead_time_days,
            )?,
            short_shelf_life_days: self.get_parsed_or_default(
                config_keys::SHORT_SHELF_LIFE_DAYS,
                defaults.short_shelf_life_days,
            )?,
            reorder_days_coverage: self.get_parsed_or_default(
                config_keys::REORDER_DAYS_COVERAGE,
                defaults.reorder_days_coverage,
            )?,
            lead_time_buffer: self
                .get_parsed_or_default(config_keys::LEAD_TIME_BUFFER, defaults.lead_time_buffer)?,
            apply_lead_time_buffer: self.get_bool_or_default(
                config_keys::APPLY_LEAD_TIME_BUFFER,
                defaults.apply_lead_time_buffer,
            )?,
            demand_window_days: self.get_parsed_or_default(
                config_keys::DEMAND_WINDOW_DAYS,
                defaults.demand_window_days,
            )?,
            forecast_retry: RetryPolicy {
                max_attempts: self.get_parsed_or_default(
                    config_keys::FORECAST_RETRY_MAX_ATTEMPTS,
                    retry_defaults.max_attempts,
                )?,
                delay_ms: self.get_parsed_or_default(
                    config_keys::FORECAST_RETRY_DELAY_MS,
                    retry_defaults.delay_ms,
                )?,
            },
        };

        config.validate()?;
        tracing::debug!(?config, "流水线参数加载完成");
        Ok(config)
    }

    /// 获取所有 global 配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 运行记录里留存本次使用的配置口径
    pub fn get_config_snapshot(&self) -> Result<String, ConfigError> {
        let conn = self.get_conn()?;

        let mut stmt = conn
            .prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")
            .map_err(RepositoryError::from)?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(RepositoryError::from)?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row.map_err(RepositoryError::from)?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 收入 ABC 分级
    pub const REVENUE_SHARE_A: &str = "revenue_share_a";
    pub const REVENUE_SHARE_B: &str = "revenue_share_b";

    // 运营风险分级
    pub const LONG_LEAD_TIME_DAYS: &str = "long_lead_time_days";
    pub const SHORT_SHELF_LIFE_DAYS: &str = "short_shelf_life_days";

    // 补货
    pub const REORDER_DAYS_COVERAGE: &str = "reorder_days_coverage";
    pub const LEAD_TIME_BUFFER: &str = "lead_time_buffer";
    pub const APPLY_LEAD_TIME_BUFFER: &str = "apply_lead_time_buffer";

    // 需求窗口
    pub const DEMAND_WINDOW_DAYS: &str = "demand_window_days";

    // 外部读取重试
    pub const FORECAST_RETRY_MAX_ATTEMPTS: &str = "forecast_retry_max_attempts";
    pub const FORECAST_RETRY_DELAY_MS: &str = "forecast_retry_delay_ms";
}
