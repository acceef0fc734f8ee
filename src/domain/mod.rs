// ==========================================
// 库存补货决策系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod product;
pub mod types;

// 重导出核心类型
pub use product::{
    DemandHistoryRow, ProductClassification, ProductRecord, ReorderDecision, StockoutRisk,
};
pub use types::{AbcClass, ReorderReason};
