// ==========================================
// 库存补货决策系统 - 产品记录
// ==========================================
// ProductRecord 是贯穿整条流水线的唯一实体
// 字段按阶段"追加式"补充，任何阶段不删除上游字段
// ==========================================

use crate::domain::types::{AbcClass, ReorderReason};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// ProductRecord - 产品/库存/供应商联合记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    // ===== 产品主数据 =====
    pub product_id: i64,
    pub sku: String,
    pub name: String,

    // ===== 库存 =====
    pub current_stock: i64,
    pub committed_stock: i64,
    pub available_stock: i64, // = current_stock - committed_stock
    pub reorder_point: i64,
    pub last_stockout_date: Option<NaiveDate>,

    // ===== 供应商 =====
    pub supplier_id: i64,
    pub reliability_score: Option<f64>,
    pub average_lead_time_days: Option<f64>,
    pub lead_time_std_dev: Option<f64>,
    pub unit_cost: f64,

    // ===== 需求 =====
    // None 表示窗口内没有任何需求记录
    pub average_daily_demand: Option<f64>,

    // ===== 产品属性 + 已持久化分级 =====
    pub shelf_life_days: Option<i64>,
    pub financial_classification: Option<AbcClass>,
    pub operational_risk: Option<AbcClass>,

    // ===== 流水线追加字段 =====
    #[serde(flatten)]
    pub classification: Option<ProductClassification>,

    pub forecasted_demand_30d: Option<u64>,

    #[serde(flatten)]
    pub risk: Option<StockoutRisk>,

    #[serde(flatten)]
    pub reorder: Option<ReorderDecision>,
}

/// 分级结果（Classifier 追加）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductClassification {
    pub computed_financial_class: AbcClass,
    pub computed_operational_risk: AbcClass,
}

/// 断货风险（Risk Analyzer 追加）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StockoutRisk {
    pub at_risk_of_stockout: bool,
    /// 日需求为 0 时为 None
    pub days_until_stockout: Option<f64>,
    pub expected_consumption_during_lead_time: f64,
}

/// 补货决策（Recommender 追加）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderDecision {
    pub should_reorder: bool,
    pub recommended_reorder_qty: u64,
    pub reorder_reason: ReorderReason,
}

impl ProductRecord {
    /// 平均提前期（天）；非有限值视为缺失
    pub fn lead_time_days(&self) -> Option<f64> {
        self.average_lead_time_days.filter(|v| v.is_finite())
    }

    /// 提前期标准差（天）；非有限值视为缺失
    pub fn lead_time_std_dev_days(&self) -> Option<f64> {
        self.lead_time_std_dev.filter(|v| v.is_finite())
    }

    /// 单位成本；非有限值按 0 处理
    pub fn unit_cost_or_zero(&self) -> f64 {
        if self.unit_cost.is_finite() {
            self.unit_cost
        } else {
            0.0
        }
    }

    /// 库存口径是否自洽（available = current - committed）
    pub fn stock_is_consistent(&self) -> bool {
        self.current_stock.checked_sub(self.committed_stock) == Some(self.available_stock)
    }

    pub fn should_reorder(&self) -> bool {
        self.reorder.map(|r| r.should_reorder).unwrap_or(false)
    }
}

// ==========================================
// DemandHistoryRow - 需求历史原始行
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandHistoryRow {
    pub product_id: i64,
    pub date: NaiveDate,
    pub actual_demand: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> ProductRecord {
        ProductRecord {
            product_id: 7,
            sku: "SKU-7".to_string(),
            name: "Seven".to_string(),
            current_stock: 50,
            committed_stock: 5,
            available_stock: 45,
            reorder_point: 10,
            last_stockout_date: None,
            supplier_id: 1,
            reliability_score: Some(0.9),
            average_lead_time_days: Some(f64::NAN),
            lead_time_std_dev: Some(2.0),
            unit_cost: f64::INFINITY,
            average_daily_demand: None,
            shelf_life_days: None,
            financial_classification: Some(AbcClass::B),
            operational_risk: None,
            classification: None,
            forecasted_demand_30d: None,
            risk: None,
            reorder: None,
        }
    }

    #[test]
    fn test_non_finite_numbers_are_absent_or_zero() {
        let r = record();
        assert_eq!(r.lead_time_days(), None, "NaN 提前期应视为缺失");
        assert_eq!(r.lead_time_std_dev_days(), Some(2.0));
        assert_eq!(r.unit_cost_or_zero(), 0.0, "非有限成本应按 0 处理");
    }

    #[test]
    fn test_stock_consistency() {
        let mut r = record();
        assert!(r.stock_is_consistent());
        r.available_stock = 44;
        assert!(!r.stock_is_consistent());
    }

    #[test]
    fn test_enrichment_serializes_flat() {
        let mut r = record();
        r.unit_cost = 3.0;
        r.average_lead_time_days = Some(10.0);
        r.reorder = Some(ReorderDecision {
            should_reorder: true,
            recommended_reorder_qty: 12,
            reorder_reason: ReorderReason::StockoutRisk,
        });

        let value = serde_json::to_value(&r).unwrap();
        assert_eq!(value["should_reorder"], serde_json::json!(true));
        assert_eq!(value["recommended_reorder_qty"], serde_json::json!(12));
        assert_eq!(
            value["reorder_reason"],
            serde_json::json!("Stockout risk within lead time")
        );
        assert!(
            value.get("computed_financial_class").is_none(),
            "未分级时不应输出分级字段"
        );
    }
}
