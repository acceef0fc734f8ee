// ==========================================
// 库存补货决策系统 - 产品分级引擎
// ==========================================
// 职责: 计算两个互相独立的分级
//   1) 收入 ABC 分级（需要整批数据做累计占比）
//   2) 运营风险分级（提前期 × 保质期，逐条独立）
// 输出: ProductRecord.classification
// 红线: 分级只追加 computed_* 字段，不改写已持久化的分级
// ==========================================

use crate::config::PipelineConfig;
use crate::domain::product::{ProductClassification, ProductRecord};
use crate::domain::types::AbcClass;
use crate::engine::error::PipelineResult;
use crate::engine::stage::{PipelineStage, PipelineState};
use tracing::{debug, instrument};

pub const STAGE_NAME: &str = "classify_product";

// ==========================================
// ProductClassifier - 产品分级引擎
// ==========================================
pub struct ProductClassifier {
    revenue_share_a: f64,
    revenue_share_b: f64,
    long_lead_time_days: f64,
    short_shelf_life_days: i64,
    revenue_window_days: f64,
}

impl ProductClassifier {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            revenue_share_a: config.revenue_share_a,
            revenue_share_b: config.revenue_share_b,
            long_lead_time_days: config.long_lead_time_days,
            short_shelf_life_days: config.short_shelf_life_days,
            revenue_window_days: config.window_days_f64(),
        }
    }

    // ==========================================
    // 收入 ABC 分级
    // ==========================================

    /// 窗口收入 = 日均需求(缺失按 0) × 单位成本 × 窗口天数
    ///
    /// 结果为负或非有限值时记 0，保证累计占比单调
    pub fn recent_revenue(&self, record: &ProductRecord) -> f64 {
        let demand = record
            .average_daily_demand
            .filter(|d| d.is_finite())
            .unwrap_or(0.0);
        let revenue = demand * record.unit_cost_or_zero() * self.revenue_window_days;
        if revenue.is_finite() && revenue > 0.0 {
            revenue
        } else {
            0.0
        }
    }

    /// 累计收入占比 → 分级
    ///
    /// share 为 None（总收入为 0 时占比无定义）→ C
    pub fn financial_class(&self, share: Option<f64>) -> AbcClass {
        match share {
            Some(s) if s <= self.revenue_share_a => AbcClass::A,
            Some(s) if s <= self.revenue_share_b => AbcClass::B,
            _ => AbcClass::C,
        }
    }

    /// 累计收入占比（两遍扫描）
    ///
    /// 1) 逐条计算收入与总收入
    /// 2) 在按收入降序（同收入按 product_id 升序）的索引上累加占比
    ///
    /// # 返回
    /// - 按累加顺序排列的 (输入下标, 累计占比)
    /// - 总收入为 0 时占比为 None
    pub fn revenue_shares(&self, records: &[ProductRecord]) -> Vec<(usize, Option<f64>)> {
        let revenues: Vec<f64> = records.iter().map(|r| self.recent_revenue(r)).collect();
        let total: f64 = revenues.iter().sum();
        let has_total = total > 0.0 && total.is_finite();

        let mut order: Vec<usize> = (0..records.len()).collect();
        order.sort_by(|&a, &b| {
            revenues[b]
                .total_cmp(&revenues[a])
                .then_with(|| records[a].product_id.cmp(&records[b].product_id))
        });

        let mut running = 0.0;
        order
            .into_iter()
            .map(|idx| {
                running += revenues[idx];
                let share = if has_total {
                    Some((running / total).min(1.0))
                } else {
                    None
                };
                (idx, share)
            })
            .collect()
    }

    /// 整批计算收入分级
    ///
    /// 返回值与输入顺序一一对应
    pub fn financial_classes(&self, records: &[ProductRecord]) -> Vec<AbcClass> {
        let mut classes = vec![AbcClass::C; records.len()];
        for (idx, share) in self.revenue_shares(records) {
            classes[idx] = self.financial_class(share);
        }
        classes
    }

    // ==========================================
    // 运营风险分级
    // ==========================================

    /// 长提前期 + 短保质期 → A；其一 → B；都不 → C
    ///
    /// 缺失值永远不算命中
    pub fn operational_risk(&self, record: &ProductRecord) -> AbcClass {
        let long_lead = record
            .lead_time_days()
            .map(|d| d > self.long_lead_time_days)
            .unwrap_or(false);
        let short_shelf = record
            .shelf_life_days
            .map(|d| d < self.short_shelf_life_days)
            .unwrap_or(false);

        match (long_lead, short_shelf) {
            (true, true) => AbcClass::A,
            (true, false) | (false, true) => AbcClass::B,
            (false, false) => AbcClass::C,
        }
    }

    /// 整批分级并写回记录
    pub fn classify_batch(&self, records: &mut [ProductRecord]) {
        let financial = self.financial_classes(records);

        for (record, computed_financial_class) in records.iter_mut().zip(financial) {
            let computed_operational_risk = self.operational_risk(record);
            record.classification = Some(ProductClassification {
                computed_financial_class,
                computed_operational_risk,
            });
        }
    }
}

impl PipelineStage for ProductClassifier {
    fn name(&self) -> &'static str {
        STAGE_NAME
    }

    #[instrument(skip(self, state), fields(run_id = %state.run_id, count = state.records.len()))]
    fn run(&self, state: &mut PipelineState) -> PipelineResult<()> {
        self.classify_batch(&mut state.records);

        let count_of = |class: AbcClass| {
            state
                .records
                .iter()
                .filter(|r| r.classification.map(|c| c.computed_financial_class) == Some(class))
                .count()
        };
        debug!(
            class_a = count_of(AbcClass::A),
            class_b = count_of(AbcClass::B),
            class_c = count_of(AbcClass::C),
            "收入分级完成"
        );
        Ok(())
    }
}
