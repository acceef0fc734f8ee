// ==========================================
// 库存补货决策系统 - 库存加载阶段
// ==========================================
// 输入: 外部库存快照来源
// 输出: PipelineState.records（每个产品一条）
// 红线: 口径不自洽的记录直接中止运行，不静默跳过
// ==========================================

use crate::domain::product::ProductRecord;
use crate::engine::error::{PipelineError, PipelineResult};
use crate::engine::sources::InventorySource;
use crate::engine::stage::{PipelineStage, PipelineState};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, instrument};

pub const STAGE_NAME: &str = "fetch_inventory";

// ==========================================
// InventoryLoader - 库存加载
// ==========================================
pub struct InventoryLoader {
    source: Arc<dyn InventorySource>,
    window_days: u32,
}

impl InventoryLoader {
    pub fn new(source: Arc<dyn InventorySource>, window_days: u32) -> Self {
        Self {
            source,
            window_days,
        }
    }

    /// 校验整批记录
    ///
    /// 规则:
    /// 1) available_stock = current_stock - committed_stock
    /// 2) 日均需求 / 平均提前期 / 提前期标准差 不为负
    /// 3) product_id 在批次内唯一
    pub fn validate_batch(records: &[ProductRecord]) -> PipelineResult<()> {
        let mut seen = HashSet::with_capacity(records.len());

        for record in records {
            if !record.stock_is_consistent() {
                return Err(PipelineError::InvalidRecord {
                    product_id: record.product_id,
                    message: format!(
                        "available_stock={} != current_stock={} - committed_stock={}",
                        record.available_stock, record.current_stock, record.committed_stock
                    ),
                });
            }

            if let Some((field, value)) = first_negative_field(record) {
                return Err(PipelineError::InvalidRecord {
                    product_id: record.product_id,
                    message: format!("{}={} 不能为负", field, value),
                });
            }

            if !seen.insert(record.product_id) {
                return Err(PipelineError::DuplicateProduct {
                    product_id: record.product_id,
                });
            }
        }

        Ok(())
    }
}

/// 第一个为负的数值字段（NaN / 缺失不算）
fn first_negative_field(record: &ProductRecord) -> Option<(&'static str, f64)> {
    [
        ("average_daily_demand", record.average_daily_demand),
        ("average_lead_time_days", record.average_lead_time_days),
        ("lead_time_std_dev", record.lead_time_std_dev),
    ]
    .into_iter()
    .find_map(|(field, value)| match value {
        Some(v) if v < 0.0 => Some((field, v)),
        _ => None,
    })
}

impl PipelineStage for InventoryLoader {
    fn name(&self) -> &'static str {
        STAGE_NAME
    }

    #[instrument(skip(self, state), fields(run_id = %state.run_id, as_of = %state.as_of))]
    fn run(&self, state: &mut PipelineState) -> PipelineResult<()> {
        let records = self
            .source
            .fetch_inventory(state.as_of, self.window_days)
            .map_err(|e| PipelineError::data_access(STAGE_NAME, e))?;

        Self::validate_batch(&records)?;

        let without_demand = records
            .iter()
            .filter(|r| r.average_daily_demand.is_none())
            .count();
        debug!(
            count = records.len(),
            without_demand,
            "库存快照加载完成"
        );

        state.records = records;
        Ok(())
    }
}
