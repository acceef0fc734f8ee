// ==========================================
// 库存补货决策系统 - 需求历史数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑（汇总由引擎完成）
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::product::DemandHistoryRow;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::sync::{Arc, Mutex};

/// 单条 SQL 的 IN 参数上限
const MAX_IDS_PER_QUERY: usize = 500;

// ==========================================
// DemandHistoryRepository - 需求历史仓储
// ==========================================
pub struct DemandHistoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DemandHistoryRepository {
    /// 创建新的 DemandHistoryRepository 实例
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

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取指定产品在窗口内的原始需求行
    ///
    /// # 参数
    /// - product_ids: 产品ID集合（空集合直接返回空结果）
    /// - as_of: 基准日期（窗口右端，含）
    /// - window_days: 追溯天数
    ///
    /// # 返回
    /// - Ok(Vec<DemandHistoryRow>): 按 (product_id, date) 升序
    pub fn fetch_demand_history(
        &self,
        product_ids: &[i64],
        as_of: NaiveDate,
        window_days: u32,
    ) -> RepositoryResult<Vec<DemandHistoryRow>> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.get_conn()?;
        let mut rows = Vec::new();

        for chunk in product_ids.chunks(MAX_IDS_PER_QUERY) {
            let placeholders = std::iter::repeat("?")
                .take(chunk.len())
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                r#"
                SELECT product_id, date, actual_demand
                FROM demand_history
                WHERE date >= date(?1, ?2)
                  AND date <= ?1
                  AND product_id IN ({})
                ORDER BY product_id, date
                "#,
                placeholders
            );

            let mut values: Vec<Value> = Vec::with_capacity(chunk.len() + 2);
            values.push(Value::Text(as_of.to_string()));
            values.push(Value::Text(format!("-{} days", window_days)));
            values.extend(chunk.iter().map(|id| Value::Integer(*id)));

            let mut stmt = conn.prepare(&sql)?;
            let chunk_rows = stmt
                .query_map(params_from_iter(values.iter()), |row| {
                    Ok(DemandHistoryRow {
                        product_id: row.get(0)?,
                        date: row.get(1)?,
                        actual_demand: row.get(2)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows.extend(chunk_rows);
        }

        Ok(rows)
    }
}
