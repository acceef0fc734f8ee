// ==========================================
// 库存补货决策系统 - 断货风险引擎
// ==========================================
// 职责: 提前期内预计消耗 / 是否有断货风险 / 可售天数
// 输入: 可用库存 + 有效日需求 + 平均提前期
// 输出: ProductRecord.risk
// ==========================================

use crate::config::PipelineConfig;
use crate::domain::product::{ProductRecord, StockoutRisk};
use crate::engine::demand::{effective_daily_demand, round_to_decimals};
use crate::engine::error::PipelineResult;
use crate::engine::stage::{PipelineStage, PipelineState};
use tracing::{debug, instrument};

pub const STAGE_NAME: &str = "risk_analyzer";

// ==========================================
// StockoutRiskAnalyzer - 断货风险引擎
// ==========================================
pub struct StockoutRiskAnalyzer {
    window_days: f64,
}

impl StockoutRiskAnalyzer {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            window_days: config.window_days_f64(),
        }
    }

    /// 单条记录风险评估
    ///
    /// 规则:
    /// - 日需求为 0 → 无风险，可售天数为空，预计消耗 0
    /// - 否则 预计消耗 = 日需求 × 平均提前期(缺失按 0)
    ///   有风险 ⇔ 可用库存 < 预计消耗（用未舍入值比较）
    ///   可售天数 = 可用库存 / 日需求（可用为负时记 0）
    ///   预计消耗与可售天数保留两位小数
    pub fn analyze(&self, record: &ProductRecord) -> StockoutRisk {
        let daily_demand = effective_daily_demand(record, self.window_days);
        if daily_demand == 0.0 {
            return StockoutRisk {
                at_risk_of_stockout: false,
                days_until_stockout: None,
                expected_consumption_during_lead_time: 0.0,
            };
        }

        let lead_time = record.lead_time_days().unwrap_or(0.0);
        let expected_consumption = daily_demand * lead_time;
        let available = record.available_stock as f64;

        StockoutRisk {
            at_risk_of_stockout: available < expected_consumption,
            days_until_stockout: Some(round_to_decimals((available / daily_demand).max(0.0), 2)),
            expected_consumption_during_lead_time: round_to_decimals(expected_consumption, 2),
        }
    }
}

impl PipelineStage for StockoutRiskAnalyzer {
    fn name(&self) -> &'static str {
        STAGE_NAME
    }

    #[instrument(skip(self, state), fields(run_id = %state.run_id, count = state.records.len()))]
    fn run(&self, state: &mut PipelineState) -> PipelineResult<()> {
        for record in state.records.iter_mut() {
            record.risk = Some(self.analyze(record));
        }

        let at_risk = state
            .records
            .iter()
            .filter(|r| r.risk.map(|x| x.at_risk_of_stockout).unwrap_or(false))
            .count();
        debug!(at_risk, "断货风险评估完成");
        Ok(())
    }
}
