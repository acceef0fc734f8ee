// ==========================================
// 库存补货决策系统 - 流水线参数
// ==========================================
// 所有阈值显式命名 + 默认值，由构造函数注入流水线
// ==========================================

use crate::repository::error::RepositoryError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置值无效 (key={key}): {message}")]
    Invalid { key: &'static str, message: String },

    #[error("配置读取失败: {0}")]
    Storage(#[from] RepositoryError),

    #[error("配置快照序列化失败: {0}")]
    Snapshot(#[from] serde_json::Error),
}

// ==========================================
// RetryPolicy - 外部读取重试策略
// ==========================================
/// 固定间隔、有上限的重试
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// 最大尝试次数（含首次）
    pub max_attempts: u32,
    /// 两次尝试之间的等待（毫秒）
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_ms: 200,
        }
    }
}

impl RetryPolicy {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

// ==========================================
// PipelineConfig - 流水线参数全集
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    // ===== 收入 ABC 分级 =====
    /// 累计收入占比 ≤ 该值 → A
    pub revenue_share_a: f64,
    /// 累计收入占比 ≤ 该值 → B，否则 C
    pub revenue_share_b: f64,

    // ===== 运营风险分级 =====
    /// 平均提前期 > 该值视为长提前期
    pub long_lead_time_days: f64,
    /// 保质期 < 该值视为短保质期
    pub short_shelf_life_days: i64,

    // ===== 补货 =====
    /// 补货目标覆盖天数
    pub reorder_days_coverage: f64,
    /// 提前期缓冲系数
    pub lead_time_buffer: f64,
    /// 是否把缓冲系数乘到有效提前期上（默认关闭）
    pub apply_lead_time_buffer: bool,

    // ===== 需求窗口 =====
    /// 追溯窗口天数（日均需求、30 天预测、收入口径共用）
    pub demand_window_days: u32,

    // ===== 外部读取 =====
    pub forecast_retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            revenue_share_a: 0.70,
            revenue_share_b: 0.90,
            long_lead_time_days: 14.0,
            short_shelf_life_days: 30,
            reorder_days_coverage: 30.0,
            lead_time_buffer: 1.25,
            apply_lead_time_buffer: false,
            demand_window_days: 30,
            forecast_retry: RetryPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// 校验参数组合
    pub fn validate(&self) -> Result<(), ConfigError> {
        let share_ok = |v: f64| v.is_finite() && v > 0.0 && v <= 1.0;

        if !share_ok(self.revenue_share_a) {
            return Err(invalid(
                "revenue_share_a",
                format!("应在 (0, 1] 内, 实际 {}", self.revenue_share_a),
            ));
        }
        if !share_ok(self.revenue_share_b) {
            return Err(invalid(
                "revenue_share_b",
                format!("应在 (0, 1] 内, 实际 {}", self.revenue_share_b),
            ));
        }
        if self.revenue_share_a > self.revenue_share_b {
            return Err(invalid(
                "revenue_share_a",
                format!(
                    "A 档阈值 {} 不能大于 B 档阈值 {}",
                    self.revenue_share_a, self.revenue_share_b
                ),
            ));
        }
        if !self.long_lead_time_days.is_finite() || self.long_lead_time_days < 0.0 {
            return Err(invalid(
                "long_lead_time_days",
                format!("应为非负数, 实际 {}", self.long_lead_time_days),
            ));
        }
        if self.short_shelf_life_days < 0 {
            return Err(invalid(
                "short_shelf_life_days",
                format!("应为非负数, 实际 {}", self.short_shelf_life_days),
            ));
        }
        if !self.reorder_days_coverage.is_finite() || self.reorder_days_coverage <= 0.0 {
            return Err(invalid(
                "reorder_days_coverage",
                format!("应为正数, 实际 {}", self.reorder_days_coverage),
            ));
        }
        if !self.lead_time_buffer.is_finite() || self.lead_time_buffer <= 0.0 {
            return Err(invalid(
                "lead_time_buffer",
                format!("应为正数, 实际 {}", self.lead_time_buffer),
            ));
        }
        if self.demand_window_days == 0 {
            return Err(invalid("demand_window_days", "应为正整数".to_string()));
        }
        if self.forecast_retry.max_attempts == 0 {
            return Err(invalid(
                "forecast_retry_max_attempts",
                "至少尝试 1 次".to_string(),
            ));
        }
        Ok(())
    }

    /// 窗口天数（浮点），用于收入口径与日均需求回退
    pub fn window_days_f64(&self) -> f64 {
        f64::from(self.demand_window_days)
    }
}

fn invalid(key: &'static str, message: String) -> ConfigError {
    ConfigError::Invalid { key, message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.revenue_share_a, 0.70);
        assert_eq!(config.revenue_share_b, 0.90);
        assert_eq!(config.long_lead_time_days, 14.0);
        assert_eq!(config.short_shelf_life_days, 30);
        assert_eq!(config.reorder_days_coverage, 30.0);
        assert_eq!(config.lead_time_buffer, 1.25);
        assert!(!config.apply_lead_time_buffer, "缓冲系数默认不参与计算");
        assert_eq!(config.demand_window_days, 30);
    }

    #[test]
    fn test_share_order_rejected() {
        let config = PipelineConfig {
            revenue_share_a: 0.95,
            revenue_share_b: 0.90,
            ..PipelineConfig::default()
        };
        match config.validate() {
            Err(ConfigError::Invalid { key, .. }) => assert_eq!(key, "revenue_share_a"),
            other => panic!("应拒绝 A>B 的阈值, 实际 {:?}", other),
        }
    }

    #[test]
    fn test_zero_window_and_attempts_rejected() {
        let config = PipelineConfig {
            demand_window_days: 0,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = PipelineConfig {
            forecast_retry: RetryPolicy {
                max_attempts: 0,
                delay_ms: 0,
            },
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_nan_share_rejected() {
        let config = PipelineConfig {
            revenue_share_b: f64::NAN,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
