// ==========================================
// 库存补货决策系统 - 库存快照数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 产品 × 库存 × 供应商 联合查询 + 窗口日均需求
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::product::ProductRecord;
use crate::domain::types::AbcClass;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

const INVENTORY_SNAPSHOT_SQL: &str = r#"
    SELECT
        p.product_id,
        p.sku,
        p.name,
        i.current_stock,
        i.committed_stock,
        i.reorder_point,
        (i.current_stock - i.committed_stock) AS available_stock,
        ps.average_lead_time_days,
        ps.lead_time_std_dev,
        ps.unit_cost,
        s.supplier_id,
        s.reliability_score,
        (
            SELECT AVG(dh.actual_demand)
            FROM demand_history dh
            WHERE dh.product_id = p.product_id
              AND dh.date >= date(?1, ?2)
              AND dh.date <= ?1
        ) AS average_daily_demand,
        i.last_stockout_date,
        p.shelf_life_days,
        p.financial_classification,
        p.operational_risk
    FROM products p
    JOIN inventory i ON p.product_id = i.product_id
    JOIN product_suppliers ps ON p.product_id = ps.product_id
    JOIN suppliers s ON ps.supplier_id = s.supplier_id
    ORDER BY p.product_id
"#;

/// 查询行（可空列保持 Option，映射后再校验）
struct InventoryRow {
    product_id: i64,
    sku: Option<String>,
    name: Option<String>,
    current_stock: i64,
    committed_stock: i64,
    reorder_point: i64,
    available_stock: i64,
    average_lead_time_days: Option<f64>,
    lead_time_std_dev: Option<f64>,
    unit_cost: f64,
    supplier_id: i64,
    reliability_score: Option<f64>,
    average_daily_demand: Option<f64>,
    last_stockout_date: Option<NaiveDate>,
    shelf_life_days: Option<i64>,
    financial_classification: Option<String>,
    operational_risk: Option<String>,
}

impl InventoryRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            product_id: row.get(0)?,
            sku: row.get(1)?,
            name: row.get(2)?,
            current_stock: row.get(3)?,
            committed_stock: row.get(4)?,
            reorder_point: row.get(5)?,
            available_stock: row.get(6)?,
            average_lead_time_days: row.get(7)?,
            lead_time_std_dev: row.get(8)?,
            unit_cost: row.get(9)?,
            supplier_id: row.get(10)?,
            reliability_score: row.get(11)?,
            average_daily_demand: row.get(12)?,
            last_stockout_date: row.get(13)?,
            shelf_life_days: row.get(14)?,
            financial_classification: row.get(15)?,
            operational_risk: row.get(16)?,
        })
    }

    fn into_record(self) -> RepositoryResult<ProductRecord> {
        let id = self.product_id.to_string();
        let sku = self.sku.ok_or_else(|| RepositoryError::MissingField {
            entity: "product",
            id: id.clone(),
            field: "sku",
        })?;
        let name = self.name.ok_or_else(|| RepositoryError::MissingField {
            entity: "product",
            id: id.clone(),
            field: "name",
        })?;

        Ok(ProductRecord {
            product_id: self.product_id,
            sku,
            name,
            current_stock: self.current_stock,
            committed_stock: self.committed_stock,
            available_stock: self.available_stock,
            reorder_point: self.reorder_point,
            last_stockout_date: self.last_stockout_date,
            supplier_id: self.supplier_id,
            reliability_score: self.reliability_score,
            average_lead_time_days: self.average_lead_time_days,
            lead_time_std_dev: self.lead_time_std_dev,
            unit_cost: self.unit_cost,
            average_daily_demand: self.average_daily_demand,
            shelf_life_days: self.shelf_life_days,
            financial_classification: parse_class(
                "financial_classification",
                self.financial_classification,
            )?,
            operational_risk: parse_class("operational_risk", self.operational_risk)?,
            classification: None,
            forecasted_demand_30d: None,
            risk: None,
            reorder: None,
        })
    }
}

fn parse_class(field: &str, raw: Option<String>) -> RepositoryResult<Option<AbcClass>> {
    match raw {
        None => Ok(None),
        Some(text) => AbcClass::parse(&text)
            .map(Some)
            .ok_or_else(|| RepositoryError::FieldValueError {
                field: field.to_string(),
                message: format!("未知分级: {}", text),
            }),
    }
}

// ==========================================
// InventoryRepository - 库存快照仓储
// ==========================================
/// 库存快照仓储
/// 职责: 读取 products / inventory / product_suppliers / suppliers 联合视图
/// 红线: 不含业务逻辑，只负责数据访问
pub struct InventoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl InventoryRepository {
    /// 创建新的 InventoryRepository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let mut conn = open_sqlite_connection(db_path)?;
        crate::perf::install_sqlite_tracing(&mut conn);
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取全部产品的库存快照
    ///
    /// # 参数
    /// - as_of: 基准日期（窗口右端，含）
    /// - window_days: 日均需求追溯天数
    ///
    /// # 返回
    /// - Ok(Vec<ProductRecord>): 按 product_id 升序，每个产品一行
    /// - Err: 数据库错误 / 必填字段缺失
    pub fn fetch_inventory(
        &self,
        as_of: NaiveDate,
        window_days: u32,
    ) -> RepositoryResult<Vec<ProductRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(INVENTORY_SNAPSHOT_SQL)?;

        let rows = stmt
            .query_map(
                params![as_of.to_string(), format!("-{} days", window_days)],
                InventoryRow::from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(InventoryRow::into_record).collect()
    }
}
