// ==========================================
// 库存补货决策系统 - 外部数据源接口
// ==========================================
// 职责: 定义流水线所需的两个外部协作方接口
// 说明: Engine 层定义 trait，仓储层（SQLite）或内存批次实现
// ==========================================

use crate::domain::product::{DemandHistoryRow, ProductRecord};
use crate::repository::{DemandHistoryRepository, InventoryRepository, RepositoryResult};
use chrono::NaiveDate;

// ==========================================
// InventorySource - 库存快照来源
// ==========================================
pub trait InventorySource: Send + Sync {
    /// 读取每个产品一行的库存快照（含窗口日均需求）
    fn fetch_inventory(
        &self,
        as_of: NaiveDate,
        window_days: u32,
    ) -> RepositoryResult<Vec<ProductRecord>>;
}

// ==========================================
// DemandHistorySource - 需求历史来源
// ==========================================
pub trait DemandHistorySource: Send + Sync {
    /// 读取指定产品在窗口内的原始需求行
    fn fetch_demand_history(
        &self,
        product_ids: &[i64],
        as_of: NaiveDate,
        window_days: u32,
    ) -> RepositoryResult<Vec<DemandHistoryRow>>;
}

// ==========================================
// SQLite 仓储实现
// ==========================================

impl InventorySource for InventoryRepository {
    fn fetch_inventory(
        &self,
        as_of: NaiveDate,
        window_days: u32,
    ) -> RepositoryResult<Vec<ProductRecord>> {
        InventoryRepository::fetch_inventory(self, as_of, window_days)
    }
}

impl DemandHistorySource for DemandHistoryRepository {
    fn fetch_demand_history(
        &self,
        product_ids: &[i64],
        as_of: NaiveDate,
        window_days: u32,
    ) -> RepositoryResult<Vec<DemandHistoryRow>> {
        DemandHistoryRepository::fetch_demand_history(self, product_ids, as_of, window_days)
    }
}

// ==========================================
// 内存批次实现
// ==========================================

/// 调用方已持有的库存批次（原样返回，日均需求由调用方给定）
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventory {
    records: Vec<ProductRecord>,
}

impl InMemoryInventory {
    pub fn new(records: Vec<ProductRecord>) -> Self {
        Self { records }
    }
}

impl InventorySource for InMemoryInventory {
    fn fetch_inventory(
        &self,
        _as_of: NaiveDate,
        _window_days: u32,
    ) -> RepositoryResult<Vec<ProductRecord>> {
        Ok(self.records.clone())
    }
}

/// 内存需求历史（按窗口与产品ID过滤）
#[derive(Debug, Clone, Default)]
pub struct InMemoryDemandHistory {
    rows: Vec<DemandHistoryRow>,
}

impl InMemoryDemandHistory {
    pub fn new(rows: Vec<DemandHistoryRow>) -> Self {
        Self { rows }
    }
}

impl DemandHistorySource for InMemoryDemandHistory {
    fn fetch_demand_history(
        &self,
        product_ids: &[i64],
        as_of: NaiveDate,
        window_days: u32,
    ) -> RepositoryResult<Vec<DemandHistoryRow>> {
        let window_start = as_of - chrono::Duration::days(i64::from(window_days));
        Ok(self
            .rows
            .iter()
            .filter(|row| row.date >= window_start && row.date <= as_of)
            .filter(|row| product_ids.contains(&row.product_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn test_in_memory_history_filters_window_and_ids() {
        let source = InMemoryDemandHistory::new(vec![
            DemandHistoryRow {
                product_id: 1,
                date: day(1),
                actual_demand: 5,
            },
            DemandHistoryRow {
                product_id: 1,
                date: day(20),
                actual_demand: 6,
            },
            DemandHistoryRow {
                product_id: 2,
                date: day(20),
                actual_demand: 7,
            },
            DemandHistoryRow {
                product_id: 1,
                date: day(31),
                actual_demand: 8,
            },
        ]);

        // 窗口: [3/11, 3/21]
        let rows = source.fetch_demand_history(&[1], day(21), 10).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].actual_demand, 6);
    }
}
