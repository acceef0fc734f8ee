// ==========================================
// 库存补货决策系统 - 流水线编排器
// ==========================================
// 用途: 按固定顺序串联五个阶段
//   fetch_inventory → classify_product → forecast_demand
//   → risk_analyzer → recommend_reorder
// 约束: 严格线性，上一阶段完成后才进入下一阶段
// 红线: 任一阶段失败整次运行失败，不返回部分结果
// ==========================================

use crate::config::PipelineConfig;
use crate::domain::product::ProductRecord;
use crate::engine::classifier::ProductClassifier;
use crate::engine::error::PipelineResult;
use crate::engine::forecaster::DemandForecaster;
use crate::engine::loader::InventoryLoader;
use crate::engine::recommender::ReorderRecommender;
use crate::engine::risk::StockoutRiskAnalyzer;
use crate::engine::sources::{DemandHistorySource, InventorySource};
use crate::engine::stage::{PipelineStage, PipelineState};
use crate::perf::PerfGuard;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

// ==========================================
// StageReport / PipelineRun - 运行结果
// ==========================================

/// 单阶段执行统计
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: &'static str,
    /// 阶段结束时的记录数
    pub records: usize,
    pub elapsed_ms: u64,
    /// 阶段内执行的 SQL 语句数（未开启 SQL 统计时为 0）
    pub sql_count: u64,
}

/// 一次完整运行的结果
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    pub run_id: Uuid,
    pub as_of: NaiveDate,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stages: Vec<StageReport>,
    /// 全部增强后的记录（与库存快照同序）
    pub records: Vec<ProductRecord>,
}

impl PipelineRun {
    /// 需要补货的记录
    pub fn reorder_candidates(&self) -> Vec<&ProductRecord> {
        self.records.iter().filter(|r| r.should_reorder()).collect()
    }
}

// ==========================================
// InventoryPipeline - 流水线编排器
// ==========================================

pub struct InventoryPipeline {
    config: PipelineConfig,
    stages: Vec<Box<dyn PipelineStage>>,
}

impl InventoryPipeline {
    /// 创建流水线
    ///
    /// # 参数
    /// - config: 流水线配置（创建时校验）
    /// - inventory: 库存快照来源
    /// - demand_history: 需求历史来源
    pub fn new(
        config: PipelineConfig,
        inventory: Arc<dyn InventorySource>,
        demand_history: Arc<dyn DemandHistorySource>,
    ) -> PipelineResult<Self> {
        config.validate()?;

        let stages: Vec<Box<dyn PipelineStage>> = vec![
            Box::new(InventoryLoader::new(inventory, config.demand_window_days)),
            Box::new(ProductClassifier::new(&config)),
            Box::new(DemandForecaster::new(demand_history, &config)),
            Box::new(StockoutRiskAnalyzer::new(&config)),
            Box::new(ReorderRecommender::new(&config)),
        ];

        Ok(Self { config, stages })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// 阶段名（按执行顺序）
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// 执行完整流水线
    ///
    /// # 参数
    /// - as_of: 基准日期（需求窗口为 [as_of - 窗口天数, as_of]）
    ///
    /// # 返回
    /// - Ok(PipelineRun): 全部阶段成功
    /// - Err(PipelineError): 第一个失败阶段的错误
    pub fn run(&self, as_of: NaiveDate) -> PipelineResult<PipelineRun> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut state = PipelineState::new(run_id, as_of);
        let mut reports = Vec::with_capacity(self.stages.len());

        info!(%run_id, %as_of, stages = self.stages.len(), "开始执行补货流水线");

        for stage in &self.stages {
            let perf = PerfGuard::new(stage.name());

            if let Err(e) = stage.run(&mut state) {
                error!(
                    %run_id,
                    stage = stage.name(),
                    error = %e,
                    "流水线阶段失败，运行中止"
                );
                return Err(e);
            }

            let report = StageReport {
                stage: stage.name(),
                records: state.records.len(),
                elapsed_ms: perf.elapsed_ms(),
                sql_count: perf.sql_count(),
            };
            debug!(
                %run_id,
                stage = report.stage,
                records = report.records,
                elapsed_ms = report.elapsed_ms,
                "阶段完成"
            );
            reports.push(report);
        }

        let run = PipelineRun {
            run_id,
            as_of,
            started_at,
            finished_at: Utc::now(),
            stages: reports,
            records: state.records,
        };

        info!(
            %run_id,
            products = run.records.len(),
            to_reorder = run.reorder_candidates().len(),
            "补货流水线执行完成"
        );
        Ok(run)
    }
}
