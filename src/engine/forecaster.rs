// ==========================================
// 库存补货决策系统 - 需求预测汇总
// ==========================================
// 职责: 窗口内实际需求求和 → forecasted_demand_30d
// 说明: 不是统计预测模型，只是追溯窗口累计
// 输入: 批次 product_id 集合 + 外部需求历史
// 输出: ProductRecord.forecasted_demand_30d（无历史为 0）
// ==========================================

use crate::config::{PipelineConfig, RetryPolicy};
use crate::domain::product::{DemandHistoryRow, ProductRecord};
use crate::engine::error::{PipelineError, PipelineResult};
use crate::engine::sources::DemandHistorySource;
use crate::engine::stage::{PipelineStage, PipelineState};
use crate::repository::error::RepositoryError;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

pub const STAGE_NAME: &str = "forecast_demand";

// ==========================================
// DemandForecaster - 需求预测汇总
// ==========================================
pub struct DemandForecaster {
    source: Arc<dyn DemandHistorySource>,
    window_days: u32,
    retry: RetryPolicy,
}

impl DemandForecaster {
    pub fn new(source: Arc<dyn DemandHistorySource>, config: &PipelineConfig) -> Self {
        Self {
            source,
            window_days: config.demand_window_days,
            retry: config.forecast_retry,
        }
    }

    /// 读取需求历史（瞬时错误按固定间隔重试，有上限）
    fn fetch_with_retry(
        &self,
        product_ids: &[i64],
        as_of: NaiveDate,
    ) -> PipelineResult<Vec<DemandHistoryRow>> {
        let mut attempt: u32 = 1;
        loop {
            match self
                .source
                .fetch_demand_history(product_ids, as_of, self.window_days)
            {
                Ok(rows) => return Ok(rows),
                Err(e) if e.is_transient() && attempt < self.retry.max_attempts => {
                    warn!(
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        error = %e,
                        "需求历史读取失败，准备重试"
                    );
                    if self.retry.delay_ms > 0 {
                        std::thread::sleep(self.retry.delay());
                    }
                    attempt += 1;
                }
                Err(e) => return Err(PipelineError::data_access(STAGE_NAME, e)),
            }
        }
    }

    /// 按 product_id 汇总实际需求
    ///
    /// 负需求视为畸形数据，整批失败
    pub fn sum_by_product(rows: &[DemandHistoryRow]) -> PipelineResult<HashMap<i64, u64>> {
        let mut totals: HashMap<i64, u64> = HashMap::new();
        for row in rows {
            let demand = u64::try_from(row.actual_demand).map_err(|_| {
                PipelineError::data_access(
                    STAGE_NAME,
                    RepositoryError::FieldValueError {
                        field: "actual_demand".to_string(),
                        message: format!(
                            "product_id={} date={} 需求为负: {}",
                            row.product_id, row.date, row.actual_demand
                        ),
                    },
                )
            })?;
            let entry = totals.entry(row.product_id).or_insert(0);
            *entry = entry.saturating_add(demand);
        }
        Ok(totals)
    }

    /// 把汇总结果写回记录（按 product_id 一一匹配，缺失为 0）
    pub fn attach(records: &mut [ProductRecord], totals: &HashMap<i64, u64>) {
        for record in records.iter_mut() {
            record.forecasted_demand_30d =
                Some(totals.get(&record.product_id).copied().unwrap_or(0));
        }
    }
}

impl PipelineStage for DemandForecaster {
    fn name(&self) -> &'static str {
        STAGE_NAME
    }

    #[instrument(skip(self, state), fields(run_id = %state.run_id, count = state.records.len()))]
    fn run(&self, state: &mut PipelineState) -> PipelineResult<()> {
        let product_ids: Vec<i64> = state
            .records
            .iter()
            .map(|r| r.product_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let rows = self.fetch_with_retry(&product_ids, state.as_of)?;
        let totals = Self::sum_by_product(&rows)?;
        Self::attach(&mut state.records, &totals);

        debug!(
            history_rows = rows.len(),
            products_with_history = totals.len(),
            "需求预测汇总完成"
        );
        Ok(())
    }
}
