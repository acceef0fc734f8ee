// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================

#![allow(dead_code)]

use inventory_reorder::db;
use rusqlite::{params, Connection};
use std::error::Error;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是 UTF-8")?
        .to_string();

    let conn = db::open_sqlite_connection(&db_path)?;
    db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开测试数据库连接（统一 PRAGMA）
pub fn open_test_connection(db_path: &str) -> Result<Connection, Box<dyn Error>> {
    Ok(db::open_sqlite_connection(db_path)?)
}

// ==========================================
// 测试数据
// ==========================================

/// 单个产品的测试数据（产品 + 供应商 + 供货关系 + 库存）
#[derive(Debug, Clone)]
pub struct ProductFixture {
    pub product_id: i64,
    pub sku: Option<String>,
    pub name: Option<String>,
    pub unit_cost: f64,
    pub shelf_life_days: Option<i64>,
    pub financial_classification: Option<&'static str>,
    pub operational_risk: Option<&'static str>,
    pub supplier_id: i64,
    pub reliability_score: Option<f64>,
    pub average_lead_time_days: Option<f64>,
    pub lead_time_std_dev: Option<f64>,
    pub current_stock: i64,
    pub committed_stock: i64,
    pub reorder_point: i64,
    pub last_stockout_date: Option<&'static str>,
}

impl ProductFixture {
    pub fn new(product_id: i64) -> Self {
        Self {
            product_id,
            sku: Some(format!("SKU-{:03}", product_id)),
            name: Some(format!("Product {}", product_id)),
            unit_cost: 5.0,
            shelf_life_days: Some(180),
            financial_classification: None,
            operational_risk: None,
            supplier_id: 100 + product_id,
            reliability_score: Some(0.9),
            average_lead_time_days: Some(7.0),
            lead_time_std_dev: Some(0.0),
            current_stock: 100,
            committed_stock: 0,
            reorder_point: 20,
            last_stockout_date: None,
        }
    }

    pub fn stock(mut self, current: i64, committed: i64) -> Self {
        self.current_stock = current;
        self.committed_stock = committed;
        self
    }

    pub fn lead_time(mut self, average: Option<f64>, std_dev: Option<f64>) -> Self {
        self.average_lead_time_days = average;
        self.lead_time_std_dev = std_dev;
        self
    }
}

/// 插入一个产品的全部关联数据
pub fn insert_product(conn: &Connection, f: &ProductFixture) -> Result<(), Box<dyn Error>> {
    conn.execute(
        r#"
        INSERT INTO products (
            product_id, sku, name, category, unit_cost, selling_price,
            shelf_life_days, financial_classification, operational_risk
        ) VALUES (?1, ?2, ?3, 'general', ?4, ?5, ?6, ?7, ?8)
        "#,
        params![
            f.product_id,
            f.sku,
            f.name,
            f.unit_cost,
            f.unit_cost * 1.5,
            f.shelf_life_days,
            f.financial_classification,
            f.operational_risk,
        ],
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO suppliers (supplier_id, name, location, reliability_score)
         VALUES (?1, ?2, 'Warehouse', ?3)",
        params![f.supplier_id, format!("Supplier {}", f.supplier_id), f.reliability_score],
    )?;

    conn.execute(
        r#"
        INSERT INTO product_suppliers (
            product_id, supplier_id, supplier_sku,
            average_lead_time_days, lead_time_std_dev, unit_cost
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
        params![
            f.product_id,
            f.supplier_id,
            format!("SUP-{}", f.product_id),
            f.average_lead_time_days,
            f.lead_time_std_dev,
            f.unit_cost,
        ],
    )?;

    conn.execute(
        r#"
        INSERT INTO inventory (
            product_id, current_stock, committed_stock, reorder_point, last_stockout_date
        ) VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
        params![
            f.product_id,
            f.current_stock,
            f.committed_stock,
            f.reorder_point,
            f.last_stockout_date,
        ],
    )?;

    Ok(())
}

/// 插入一条需求历史（date 格式 YYYY-MM-DD）
pub fn insert_demand(
    conn: &Connection,
    product_id: i64,
    date: &str,
    actual_demand: i64,
) -> Result<(), Box<dyn Error>> {
    conn.execute(
        "INSERT INTO demand_history (product_id, date, forecasted_demand, actual_demand)
         VALUES (?1, ?2, NULL, ?3)",
        params![product_id, date, actual_demand],
    )?;
    Ok(())
}

/// 写入 global 配置项
pub fn insert_config(conn: &Connection, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    conn.execute(
        "INSERT OR REPLACE INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)",
        params![key, value],
    )?;
    Ok(())
}
