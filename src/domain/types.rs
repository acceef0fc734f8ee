// ==========================================
// 库存补货决策系统 - 领域类型定义
// ==========================================
// ABC 分级 + 补货原因
// 红线: 分级是"等级制",不是评分制
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// ABC 分级 (ABC Class)
// ==========================================
// 同一枚举同时用于:
// - 收入贡献分级 (financial class)
// - 运营风险分级 (operational risk)
// 顺序: A (最重要/最高风险) < B < C
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AbcClass {
    A,
    B,
    C,
}

impl AbcClass {
    /// 从数据库存储的文本解析（大小写不敏感，未知值返回 None）
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "A" => Some(AbcClass::A),
            "B" => Some(AbcClass::B),
            "C" => Some(AbcClass::C),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AbcClass::A => "A",
            AbcClass::B => "B",
            AbcClass::C => "C",
        }
    }
}

impl fmt::Display for AbcClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 补货原因 (Reorder Reason)
// ==========================================
// 固定文案，下游报表直接展示
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReorderReason {
    #[serde(rename = "No demand")]
    NoDemand,
    #[serde(rename = "Sufficient stock through lead time")]
    SufficientStock,
    #[serde(rename = "Stockout risk within lead time")]
    StockoutRisk,
}

impl ReorderReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReorderReason::NoDemand => "No demand",
            ReorderReason::SufficientStock => "Sufficient stock through lead time",
            ReorderReason::StockoutRisk => "Stockout risk within lead time",
        }
    }
}

impl fmt::Display for ReorderReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abc_class_parse() {
        assert_eq!(AbcClass::parse("A"), Some(AbcClass::A));
        assert_eq!(AbcClass::parse(" b "), Some(AbcClass::B));
        assert_eq!(AbcClass::parse("c"), Some(AbcClass::C));
        assert_eq!(AbcClass::parse("D"), None);
        assert_eq!(AbcClass::parse(""), None);
    }

    #[test]
    fn test_reorder_reason_serde_uses_display_text() {
        let json = serde_json::to_string(&ReorderReason::StockoutRisk).unwrap();
        assert_eq!(json, "\"Stockout risk within lead time\"");

        let back: ReorderReason = serde_json::from_str("\"No demand\"").unwrap();
        assert_eq!(back, ReorderReason::NoDemand);
    }
}
