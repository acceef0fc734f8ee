// ==========================================
// 库存补货决策系统 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎,不拼 SQL
// 红线: Engine 不拼 SQL, 每个补货决策必须输出 reason
// ==========================================

pub mod classifier;
pub mod demand;
pub mod error;
pub mod forecaster;
pub mod loader;
pub mod orchestrator;
pub mod recommender;
pub mod risk;
pub mod sources;
pub mod stage;

// 重导出核心引擎
pub use classifier::ProductClassifier;
pub use demand::{effective_daily_demand, round_half_even, round_to_decimals};
pub use error::{PipelineError, PipelineResult};
pub use forecaster::DemandForecaster;
pub use loader::InventoryLoader;
pub use orchestrator::{InventoryPipeline, PipelineRun, StageReport};
pub use recommender::ReorderRecommender;
pub use risk::StockoutRiskAnalyzer;
pub use sources::{DemandHistorySource, InMemoryDemandHistory, InMemoryInventory, InventorySource};
pub use stage::{PipelineStage, PipelineState};
