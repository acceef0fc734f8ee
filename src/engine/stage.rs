// ==========================================
// 库存补货决策系统 - 流水线阶段接口
// ==========================================
// 每个阶段读取整批记录、追加派生字段、交给下一阶段
// ==========================================

use crate::domain::product::ProductRecord;
use crate::engine::error::PipelineResult;
use chrono::NaiveDate;
use uuid::Uuid;

/// 单次运行内在阶段间传递的状态
#[derive(Debug, Clone)]
pub struct PipelineState {
    pub run_id: Uuid,
    /// 基准日期（需求窗口右端）
    pub as_of: NaiveDate,
    pub records: Vec<ProductRecord>,
}

impl PipelineState {
    pub fn new(run_id: Uuid, as_of: NaiveDate) -> Self {
        Self {
            run_id,
            as_of,
            records: Vec::new(),
        }
    }
}

/// 流水线阶段
pub trait PipelineStage: Send + Sync {
    /// 阶段名（日志/报告/错误定位用）
    fn name(&self) -> &'static str;

    /// 执行阶段；出错则整次运行中止
    fn run(&self, state: &mut PipelineState) -> PipelineResult<()>;
}
