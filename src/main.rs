// ==========================================
// 库存补货决策系统 - 命令行入口
// ==========================================
// 用法:
//   inventory-reorder [--db PATH] [--as-of YYYY-MM-DD] [--csv OUT] [--init-schema]
// ==========================================

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use inventory_reorder::config::ConfigManager;
use inventory_reorder::engine::InventoryPipeline;
use inventory_reorder::repository::{DemandHistoryRepository, InventoryRepository};
use inventory_reorder::{db, logging, perf, report};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// 数据库路径环境变量
const DB_PATH_ENV: &str = "INVENTORY_REORDER_DB_PATH";

#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    db_path: Option<String>,
    as_of: Option<NaiveDate>,
    csv_out: Option<PathBuf>,
    init_schema: bool,
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<CliArgs> {
    let mut parsed = CliArgs::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => {
                parsed.db_path = Some(args.next().ok_or_else(|| anyhow!("--db 缺少路径"))?);
            }
            "--as-of" => {
                let raw = args.next().ok_or_else(|| anyhow!("--as-of 缺少日期"))?;
                let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                    .with_context(|| format!("--as-of 日期格式应为 YYYY-MM-DD: {}", raw))?;
                parsed.as_of = Some(date);
            }
            "--csv" => {
                parsed.csv_out = Some(PathBuf::from(
                    args.next().ok_or_else(|| anyhow!("--csv 缺少输出路径"))?,
                ));
            }
            "--init-schema" => parsed.init_schema = true,
            other => bail!("未知参数: {}", other),
        }
    }

    Ok(parsed)
}

/// 默认数据库路径
///
/// 优先级: 环境变量 → 用户数据目录 → 当前目录
fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./inventory.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("inventory-reorder");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("inventory.db");
        }
    }
    path.to_string_lossy().to_string()
}

fn main() -> Result<()> {
    logging::init();

    let args = parse_args(std::env::args().skip(1))?;
    let db_path = args.db_path.clone().unwrap_or_else(get_default_db_path);
    let as_of = args
        .as_of
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    tracing::info!(
        app = inventory_reorder::APP_NAME,
        version = inventory_reorder::VERSION,
        db_path = %db_path,
        %as_of,
        "启动"
    );

    let mut conn = db::open_sqlite_connection(&db_path)
        .with_context(|| format!("无法打开数据库: {}", db_path))?;
    if args.init_schema {
        db::init_schema(&conn).context("建表失败")?;
    }
    perf::install_sqlite_tracing(&mut conn);
    let conn = Arc::new(Mutex::new(conn));

    let config = ConfigManager::from_connection(conn.clone())?
        .load_pipeline_config()
        .context("加载流水线配置失败")?;

    let pipeline = InventoryPipeline::new(
        config,
        Arc::new(InventoryRepository::from_connection(conn.clone())),
        Arc::new(DemandHistoryRepository::from_connection(conn)),
    )?;
    let run = pipeline.run(as_of).context("补货流水线执行失败")?;

    println!("{}", report::REORDER_HEADER);
    for line in report::reorder_lines(&run.records) {
        println!("{}", line);
    }

    let summary = report::summarize(&run);
    tracing::info!(
        total = summary.total_products,
        at_risk = summary.at_risk,
        to_reorder = summary.to_reorder,
        total_units = summary.total_units,
        "运行汇总"
    );

    if let Some(out) = &args.csv_out {
        report::write_csv(&run.records, out)
            .with_context(|| format!("CSV 导出失败: {}", out.display()))?;
    }

    Ok(())
}
