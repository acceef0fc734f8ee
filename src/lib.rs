// ==========================================
// 库存补货决策系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 决策支持系统 (只给建议，不下采购单)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 配置层 - 流水线参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 性能统计
pub mod perf;

// 结果输出
pub mod report;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    AbcClass, DemandHistoryRow, ProductClassification, ProductRecord, ReorderDecision,
    ReorderReason, StockoutRisk,
};

// 配置
pub use config::{ConfigManager, PipelineConfig, RetryPolicy};

// 引擎
pub use engine::{
    DemandForecaster, InventoryLoader, InventoryPipeline, PipelineError, PipelineRun,
    ProductClassifier, ReorderRecommender, StockoutRiskAnalyzer,
};

// 仓储
pub use repository::{DemandHistoryRepository, InventoryRepository, RepositoryError};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "库存补货决策系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
