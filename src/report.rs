// ==========================================
// 库存补货决策系统 - 运行结果输出
// ==========================================
// 职责: 补货清单文本 + 汇总统计 + CSV 导出
// 说明: 只读消费 PipelineRun，不回写任何字段
// ==========================================

use crate::domain::product::ProductRecord;
use crate::domain::types::AbcClass;
use crate::domain::ReorderReason;
use crate::engine::orchestrator::PipelineRun;
use serde::Serialize;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// 输出模块错误类型
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("文件写入失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV 写入失败: {0}")]
    Csv(String),
}

impl From<csv::Error> for ReportError {
    fn from(err: csv::Error) -> Self {
        ReportError::Csv(err.to_string())
    }
}

pub type ReportResult<T> = Result<T, ReportError>;

// ==========================================
// 补货清单
// ==========================================

/// 补货清单标题
pub const REORDER_HEADER: &str = "=== Recommended Reorders ===";

/// 每条需要补货的记录一行: `"{sku}: reorder {qty} units \u{2014} {reason}"`
pub fn reorder_lines(records: &[ProductRecord]) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| {
            r.reorder.filter(|d| d.should_reorder).map(|d| {
                format!(
                    "{}: reorder {} units \u{2014} {}",
                    r.sku, d.recommended_reorder_qty, d.reorder_reason
                )
            })
        })
        .collect()
}

// ==========================================
// 汇总统计
// ==========================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total_products: usize,
    pub at_risk: usize,
    pub to_reorder: usize,
    pub no_demand: usize,
    pub class_a: usize,
    pub class_b: usize,
    pub class_c: usize,
    /// 建议补货总量（件）
    pub total_units: u64,
}

pub fn summarize(run: &PipelineRun) -> RunSummary {
    let mut summary = RunSummary {
        total_products: run.records.len(),
        ..RunSummary::default()
    };

    for record in &run.records {
        if record.risk.map(|r| r.at_risk_of_stockout).unwrap_or(false) {
            summary.at_risk += 1;
        }
        if let Some(decision) = record.reorder {
            if decision.should_reorder {
                summary.to_reorder += 1;
                summary.total_units = summary
                    .total_units
                    .saturating_add(decision.recommended_reorder_qty);
            }
            if decision.reorder_reason == ReorderReason::NoDemand {
                summary.no_demand += 1;
            }
        }
        match record.classification.map(|c| c.computed_financial_class) {
            Some(AbcClass::A) => summary.class_a += 1,
            Some(AbcClass::B) => summary.class_b += 1,
            Some(AbcClass::C) => summary.class_c += 1,
            None => {}
        }
    }

    summary
}

// ==========================================
// CSV 导出
// ==========================================

/// CSV 行（嵌套的派生字段展开为平铺列）
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    product_id: i64,
    sku: &'a str,
    name: &'a str,
    current_stock: i64,
    committed_stock: i64,
    available_stock: i64,
    reorder_point: i64,
    last_stockout_date: Option<String>,
    supplier_id: i64,
    reliability_score: Option<f64>,
    average_lead_time_days: Option<f64>,
    lead_time_std_dev: Option<f64>,
    unit_cost: f64,
    average_daily_demand: Option<f64>,
    shelf_life_days: Option<i64>,
    financial_classification: Option<&'static str>,
    operational_risk: Option<&'static str>,
    computed_financial_class: Option<&'static str>,
    computed_operational_risk: Option<&'static str>,
    forecasted_demand_30d: Option<u64>,
    at_risk_of_stockout: Option<bool>,
    days_until_stockout: Option<f64>,
    expected_consumption_during_lead_time: Option<f64>,
    should_reorder: Option<bool>,
    recommended_reorder_qty: Option<u64>,
    reorder_reason: Option<&'static str>,
}

impl<'a> From<&'a ProductRecord> for CsvRow<'a> {
    fn from(r: &'a ProductRecord) -> Self {
        Self {
            product_id: r.product_id,
            sku: &r.sku,
            name: &r.name,
            current_stock: r.current_stock,
            committed_stock: r.committed_stock,
            available_stock: r.available_stock,
            reorder_point: r.reorder_point,
            last_stockout_date: r.last_stockout_date.map(|d| d.format("%Y-%m-%d").to_string()),
            supplier_id: r.supplier_id,
            reliability_score: r.reliability_score,
            average_lead_time_days: r.average_lead_time_days,
            lead_time_std_dev: r.lead_time_std_dev,
            unit_cost: r.unit_cost,
            average_daily_demand: r.average_daily_demand,
            shelf_life_days: r.shelf_life_days,
            financial_classification: r.financial_classification.map(|c| c.as_str()),
            operational_risk: r.operational_risk.map(|c| c.as_str()),
            computed_financial_class: r.classification.map(|c| c.computed_financial_class.as_str()),
            computed_operational_risk: r
                .classification
                .map(|c| c.computed_operational_risk.as_str()),
            forecasted_demand_30d: r.forecasted_demand_30d,
            at_risk_of_stockout: r.risk.map(|x| x.at_risk_of_stockout),
            days_until_stockout: r.risk.and_then(|x| x.days_until_stockout),
            expected_consumption_during_lead_time: r
                .risk
                .map(|x| x.expected_consumption_during_lead_time),
            should_reorder: r.reorder.map(|d| d.should_reorder),
            recommended_reorder_qty: r.reorder.map(|d| d.recommended_reorder_qty),
            reorder_reason: r.reorder.map(|d| d.reorder_reason.as_str()),
        }
    }
}

/// 把记录写成 CSV（带表头，每条记录一行）
pub fn write_csv_to<W: Write>(records: &[ProductRecord], writer: W) -> ReportResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records {
        wtr.serialize(CsvRow::from(record))?;
    }
    wtr.flush()?;
    Ok(())
}

/// 写 CSV 文件
pub fn write_csv(records: &[ProductRecord], path: &Path) -> ReportResult<()> {
    let file = std::fs::File::create(path)?;
    write_csv_to(records, file)?;
    tracing::info!(path = %path.display(), rows = records.len(), "CSV 导出完成");
    Ok(())
}
