// ==========================================
// 库存补货决策系统 - 日需求口径
// ==========================================
// 风险分析与补货建议共用同一条回退规则:
//   average_daily_demand 存在且非 0 → 直接使用
//   否则 → forecasted_demand_30d / 窗口天数
// 注意: "实测为 0" 与 "无需求数据" 在此处等价（均走回退）
// ==========================================

use crate::domain::product::ProductRecord;

/// 计算记录的有效日需求
///
/// # 参数
/// - record: 产品记录
/// - window_days: 预测窗口天数（默认 30）
///
/// # 返回
/// - f64: 非负日需求；无任何需求信息时为 0
pub fn effective_daily_demand(record: &ProductRecord, window_days: f64) -> f64 {
    match record
        .average_daily_demand
        .filter(|d| d.is_finite() && *d != 0.0)
    {
        Some(measured) => measured,
        None => {
            let forecast = record.forecasted_demand_30d.unwrap_or(0);
            if forecast == 0 || window_days <= 0.0 {
                0.0
            } else {
                forecast as f64 / window_days
            }
        }
    }
}

/// 保留 `decimals` 位小数
///
/// 按浮点数的精确十进制展开舍入，恰好居中时取偶数。
/// 例: 0.1 × 0.25 的二进制值略大于 0.025，结果为 0.03
pub fn round_to_decimals(value: f64, decimals: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.*}", decimals, value)
        .parse::<f64>()
        .unwrap_or(value)
}

/// 取整（四舍六入五成双）
pub fn round_half_even(value: f64) -> f64 {
    value.round_ties_even()
}
