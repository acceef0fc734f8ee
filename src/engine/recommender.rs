// ==========================================
// 库存补货决策系统 - 补货建议引擎
// ==========================================
// 职责: 判断是否补货 + 补货数量 + 原因
// 输入: 可用库存 + 有效日需求 + 提前期(均值 + 1 倍标准差)
// 输出: ProductRecord.reorder
// 红线: 每个决策必须带 reason
// ==========================================

use crate::config::PipelineConfig;
use crate::domain::product::{ProductRecord, ReorderDecision};
use crate::domain::types::ReorderReason;
use crate::engine::demand::{effective_daily_demand, round_half_even};
use crate::engine::error::PipelineResult;
use crate::engine::stage::{PipelineStage, PipelineState};
use tracing::{debug, instrument};

pub const STAGE_NAME: &str = "recommend_reorder";

// ==========================================
// ReorderRecommender - 补货建议引擎
// ==========================================
pub struct ReorderRecommender {
    window_days: f64,
    reorder_days_coverage: f64,
    lead_time_buffer: f64,
    apply_lead_time_buffer: bool,
}

impl ReorderRecommender {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            window_days: config.window_days_f64(),
            reorder_days_coverage: config.reorder_days_coverage,
            lead_time_buffer: config.lead_time_buffer,
            apply_lead_time_buffer: config.apply_lead_time_buffer,
        }
    }

    /// 有效提前期 = 平均提前期 + 标准差（缺失各按 0）
    ///
    /// 开启缓冲时再乘以 lead_time_buffer
    pub fn effective_lead_time(&self, record: &ProductRecord) -> f64 {
        let base = record.lead_time_days().unwrap_or(0.0)
            + record.lead_time_std_dev_days().unwrap_or(0.0);
        if self.apply_lead_time_buffer {
            base * self.lead_time_buffer
        } else {
            base
        }
    }

    /// 单条记录补货决策（只依赖记录的基础字段与预测，忽略已有决策）
    ///
    /// 规则（顺序执行，命中即返回）:
    /// 1) 日需求为 0 → 不补货 "No demand"
    /// 2) 可用库存 ≥ 日需求 × 有效提前期
    ///    → 不补货 "Sufficient stock through lead time"
    /// 3) 否则 补货量 = max(0, round(日需求 × 覆盖天数 - 可用库存))
    ///    → 补货 "Stockout risk within lead time"
    pub fn recommend(&self, record: &ProductRecord) -> ReorderDecision {
        let daily_demand = effective_daily_demand(record, self.window_days);
        if daily_demand == 0.0 {
            return ReorderDecision {
                should_reorder: false,
                recommended_reorder_qty: 0,
                reorder_reason: ReorderReason::NoDemand,
            };
        }

        let expected_consumption = daily_demand * self.effective_lead_time(record);
        let available = record.available_stock as f64;

        if available >= expected_consumption {
            return ReorderDecision {
                should_reorder: false,
                recommended_reorder_qty: 0,
                reorder_reason: ReorderReason::SufficientStock,
            };
        }

        let target_stock = daily_demand * self.reorder_days_coverage;
        let qty = round_half_even(target_stock - available).max(0.0);

        ReorderDecision {
            should_reorder: true,
            recommended_reorder_qty: qty as u64,
            reorder_reason: ReorderReason::StockoutRisk,
        }
    }
}

impl PipelineStage for ReorderRecommender {
    fn name(&self) -> &'static str {
        STAGE_NAME
    }

    #[instrument(skip(self, state), fields(run_id = %state.run_id, count = state.records.len()))]
    fn run(&self, state: &mut PipelineState) -> PipelineResult<()> {
        for record in state.records.iter_mut() {
            record.reorder = Some(self.recommend(record));
        }

        let to_reorder = state.records.iter().filter(|r| r.should_reorder()).count();
        debug!(to_reorder, "补货建议生成完成");
        Ok(())
    }
}
