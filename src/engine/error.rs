// ==========================================
// 库存补货决策系统 - 流水线错误类型
// ==========================================
// 任一阶段出错即中止整次运行，不做单记录隔离
// 软性退化（零需求/零收入/缺提前期）不是错误，由各引擎走显式分支
// ==========================================

use crate::config::ConfigError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 流水线错误类型
#[derive(Error, Debug)]
pub enum PipelineError {
    /// 外部数据源不可达或返回了畸形数据
    #[error("数据访问失败 (stage={stage}): {source}")]
    DataAccess {
        stage: &'static str,
        #[source]
        source: RepositoryError,
    },

    /// 记录缺少阶段必需的字段
    #[error("必填字段缺失 (stage={stage}, product_id={product_id:?}): {field}")]
    MissingField {
        stage: &'static str,
        product_id: Option<i64>,
        field: &'static str,
    },

    /// 记录自身口径不自洽
    #[error("记录无效 (product_id={product_id}): {message}")]
    InvalidRecord { product_id: i64, message: String },

    /// 同一批次中 product_id 重复（预测汇总要求一一对应）
    #[error("产品重复: product_id={product_id}")]
    DuplicateProduct { product_id: i64 },

    #[error("流水线配置无效: {0}")]
    Config(#[from] ConfigError),
}

impl PipelineError {
    /// 把仓储错误归类到流水线错误
    ///
    /// 仓储层报告的必填字段缺失单独归为 MissingField，其余均为 DataAccess
    pub fn data_access(stage: &'static str, err: RepositoryError) -> Self {
        match err {
            RepositoryError::MissingField { id, field, .. } => PipelineError::MissingField {
                stage,
                product_id: id.parse().ok(),
                field,
            },
            other => PipelineError::DataAccess {
                stage,
                source: other,
            },
        }
    }
}

/// Result 类型别名
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_is_reclassified() {
        let err = PipelineError::data_access(
            "fetch_inventory",
            RepositoryError::MissingField {
                entity: "product",
                id: "42".to_string(),
                field: "sku",
            },
        );
        match err {
            PipelineError::MissingField {
                stage,
                product_id,
                field,
            } => {
                assert_eq!(stage, "fetch_inventory");
                assert_eq!(product_id, Some(42));
                assert_eq!(field, "sku");
            }
            other => panic!("应归类为 MissingField, 实际 {:?}", other),
        }
    }

    #[test]
    fn test_other_errors_are_data_access() {
        let err = PipelineError::data_access(
            "forecast_demand",
            RepositoryError::DatabaseBusy("locked".to_string()),
        );
        assert!(matches!(err, PipelineError::DataAccess { stage: "forecast_demand", .. }));
        assert!(err.to_string().contains("forecast_demand"));
    }
}
