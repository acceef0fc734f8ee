// ==========================================
// 补货流水线端到端测试
// ==========================================
// 测试目标: SQLite → 五个阶段 → 补货清单 / 汇总 / CSV
// ==========================================

mod test_helpers;

use chrono::NaiveDate;
use inventory_reorder::config::{ConfigManager, PipelineConfig};
use inventory_reorder::domain::{AbcClass, ReorderReason};
use inventory_reorder::engine::{InventoryPipeline, PipelineError, PipelineRun};
use inventory_reorder::report;
use inventory_reorder::repository::{DemandHistoryRepository, InventoryRepository};
use std::sync::Arc;
use test_helpers::{
    create_test_db, insert_demand, insert_product, open_test_connection, ProductFixture,
};

fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 31).unwrap()
}

fn run_pipeline(db_path: &str) -> Result<PipelineRun, PipelineError> {
    let config = ConfigManager::new(db_path)
        .unwrap()
        .load_pipeline_config()
        .unwrap();
    let pipeline = InventoryPipeline::new(
        config,
        Arc::new(InventoryRepository::new(db_path).unwrap()),
        Arc::new(DemandHistoryRepository::new(db_path).unwrap()),
    )?;
    pipeline.run(as_of())
}

/// 三个典型产品:
/// - 1: 无需求
/// - 2: 可用 10，日需求 3，提前期 20 ± 5 → 补货 80
/// - 3: 可用 70，日需求 5，提前期 14 → 恰好覆盖
fn seed_scenarios(db_path: &str) {
    let conn = open_test_connection(db_path).unwrap();

    insert_product(&conn, &ProductFixture::new(1).stock(300, 0)).unwrap();

    insert_product(
        &conn,
        &ProductFixture::new(2).stock(10, 0).lead_time(Some(20.0), Some(5.0)),
    )
    .unwrap();
    insert_demand(&conn, 2, "2026-03-20", 3).unwrap();

    insert_product(
        &conn,
        &ProductFixture::new(3).stock(75, 5).lead_time(Some(14.0), None),
    )
    .unwrap();
    insert_demand(&conn, 3, "2026-03-25", 5).unwrap();
}

#[test]
fn test_scenario_1_no_demand() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    seed_scenarios(&db_path);

    let run = run_pipeline(&db_path).unwrap();
    let record = run.records.iter().find(|r| r.product_id == 1).unwrap();

    assert_eq!(record.forecasted_demand_30d, Some(0));
    let risk = record.risk.unwrap();
    assert!(!risk.at_risk_of_stockout);
    assert_eq!(risk.days_until_stockout, None);

    let decision = record.reorder.unwrap();
    assert!(!decision.should_reorder);
    assert_eq!(decision.reorder_reason, ReorderReason::NoDemand);
}

#[test]
fn test_scenario_2_stockout_risk_reorders_80() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    seed_scenarios(&db_path);

    let run = run_pipeline(&db_path).unwrap();
    let record = run.records.iter().find(|r| r.product_id == 2).unwrap();

    assert_eq!(record.average_daily_demand, Some(3.0));
    assert_eq!(record.forecasted_demand_30d, Some(3));

    let decision = record.reorder.unwrap();
    assert!(decision.should_reorder);
    assert_eq!(decision.recommended_reorder_qty, 80);
    assert_eq!(decision.reorder_reason, ReorderReason::StockoutRisk);
}

#[test]
fn test_scenario_3_exact_cover_is_not_at_risk() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    seed_scenarios(&db_path);

    let run = run_pipeline(&db_path).unwrap();
    let record = run.records.iter().find(|r| r.product_id == 3).unwrap();
    let risk = record.risk.unwrap();

    assert_eq!(record.available_stock, 70);
    assert_eq!(risk.expected_consumption_during_lead_time, 70.0);
    assert!(!risk.at_risk_of_stockout);
    assert_eq!(risk.days_until_stockout, Some(14.0));
}

#[test]
fn test_available_stock_preserved_through_every_stage() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    seed_scenarios(&db_path);

    let run = run_pipeline(&db_path).unwrap();
    assert_eq!(run.stages.len(), 5);
    for record in &run.records {
        assert_eq!(
            record.available_stock,
            record.current_stock - record.committed_stock,
            "可用库存口径不应被任何阶段改写"
        );
    }
}

#[test]
fn test_single_record_zero_revenue_is_class_c() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let conn = open_test_connection(&db_path).unwrap();
    insert_product(&conn, &ProductFixture::new(9)).unwrap();

    let run = run_pipeline(&db_path).unwrap();
    assert_eq!(run.records.len(), 1);
    assert_eq!(
        run.records[0].classification.unwrap().computed_financial_class,
        AbcClass::C
    );
}

#[test]
fn test_persisted_classes_are_kept_alongside_computed() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let conn = open_test_connection(&db_path).unwrap();
    let mut fixture = ProductFixture::new(4);
    fixture.financial_classification = Some("A");
    insert_product(&conn, &fixture).unwrap();

    let run = run_pipeline(&db_path).unwrap();
    let record = &run.records[0];
    assert_eq!(record.financial_classification, Some(AbcClass::A));
    assert_eq!(
        record.classification.unwrap().computed_financial_class,
        AbcClass::C,
        "计算分级不覆盖持久化分级"
    );
}

#[test]
fn test_missing_sku_fails_the_run() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let conn = open_test_connection(&db_path).unwrap();
    let mut fixture = ProductFixture::new(5);
    fixture.sku = None;
    insert_product(&conn, &fixture).unwrap();

    let err = run_pipeline(&db_path).unwrap_err();
    assert!(
        matches!(
            err,
            PipelineError::MissingField {
                stage: "fetch_inventory",
                product_id: Some(5),
                field: "sku",
            }
        ),
        "实际错误: {:?}",
        err
    );
}

#[test]
fn test_report_outputs() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    seed_scenarios(&db_path);

    let run = run_pipeline(&db_path).unwrap();

    let lines = report::reorder_lines(&run.records);
    assert_eq!(
        lines,
        vec!["SKU-002: reorder 80 units \u{2014} Stockout risk within lead time".to_string()]
    );

    let summary = report::summarize(&run);
    assert_eq!(summary.total_products, 3);
    assert_eq!(summary.to_reorder, 1);
    assert_eq!(summary.at_risk, 1);
    assert_eq!(summary.no_demand, 1);
    assert_eq!(summary.total_units, 80);
    assert_eq!(summary.class_a + summary.class_b + summary.class_c, 3);

    let out = tempfile::NamedTempFile::new().unwrap();
    report::write_csv(&run.records, out.path()).unwrap();
    let text = std::fs::read_to_string(out.path()).unwrap();
    assert_eq!(text.lines().count(), 4, "表头 + 3 行");
}

#[test]
fn test_lead_time_buffer_flag_changes_decision() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let conn = open_test_connection(&db_path).unwrap();
    // 可用 50，日需求 2，提前期 20 + 2 → 消耗 44（足够）；缓冲后 55（不足）
    insert_product(
        &conn,
        &ProductFixture::new(6).stock(50, 0).lead_time(Some(20.0), Some(2.0)),
    )
    .unwrap();
    insert_demand(&conn, 6, "2026-03-30", 2).unwrap();

    let without = run_pipeline(&db_path).unwrap();
    assert!(!without.records[0].should_reorder());

    let config = PipelineConfig {
        apply_lead_time_buffer: true,
        ..PipelineConfig::default()
    };
    let with = InventoryPipeline::new(
        config,
        Arc::new(InventoryRepository::new(&db_path).unwrap()),
        Arc::new(DemandHistoryRepository::new(&db_path).unwrap()),
    )
    .unwrap()
    .run(as_of())
    .unwrap();
    assert!(with.records[0].should_reorder());
    assert_eq!(with.records[0].reorder.unwrap().recommended_reorder_qty, 10);
}
