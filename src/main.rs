// ==========================================
// 检查排程系统 - 命令行入口
// ==========================================
// 用法: inspection-scheduler [config.json] [YYYY-MM-DD]
//   - config.json 省略时使用缺省配置路径 (不存在则缺省配置)
//   - 日期省略时以当前时刻为基准
// ==========================================

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate, NaiveDateTime};
use inspection_scheduler::config::{get_default_config_path, SchedulerConfig};
use inspection_scheduler::engine::{DiagnosticsSink, InspectionScheduler, TracingSink};
use inspection_scheduler::importer::DatasetLoader;
use inspection_scheduler::report::CsvExporter;
use inspection_scheduler::{logging, APP_NAME, VERSION};
use std::path::PathBuf;
use std::sync::Arc;

fn main() -> Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{} - 检查开始期限与检查员分配", APP_NAME);
    tracing::info!("系统版本: {}", VERSION);
    tracing::info!("==================================================");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config_path = args
        .first()
        .map(PathBuf::from)
        .unwrap_or_else(get_default_config_path);
    let now = match args.get(1) {
        Some(raw) => parse_base_date(raw)?,
        None => Local::now().naive_local(),
    };

    let mut config = SchedulerConfig::load_or_default(&config_path)
        .with_context(|| format!("配置读取失败: {}", config_path.display()))?;
    config.apply_env_overrides();
    config.validate().context("配置校验失败")?;
    tracing::debug!(config = %config.snapshot_json(), "有效配置");

    let sink: Arc<dyn DiagnosticsSink> = Arc::new(TracingSink);

    let loader = DatasetLoader::new(config.data_files.clone(), sink.clone());
    let inputs = loader.load_all().context("数据读取失败")?;
    let inspectors = inputs.inspectors.clone();

    let config = Arc::new(config);
    let scheduler = InspectionScheduler::new(config.clone(), sink);
    let run = scheduler.run(inputs, now).context("排程执行失败")?;

    tracing::info!(unit = %run.unit_decision.unit, forced = run.unit_decision.forced, "检查时间单位");
    tracing::info!("{}", run.schedule_summary);
    tracing::info!(
        inspectors = run.capacity.inspector_count,
        shift_avg = run.capacity.shift_average_hours,
        new_product_team = run.capacity.new_product_team_count,
        "人员能力"
    );
    tracing::info!(
        new_product_tasks = run.new_product_coverage.new_product_tasks,
        ok = run.new_product_coverage.ok_count,
        ng = run.new_product_coverage.ng_count,
        "新制品团队覆盖"
    );
    tracing::info!(
        skill_matched = run.skill_coverage.skill_matched_tasks,
        fully_assigned = run.skill_coverage.fully_assigned_tasks,
        "技能分配覆盖"
    );

    let stamp = if config.timestamp_outputs { Some(now) } else { None };
    let exporter = CsvExporter::new(&config.output_dir, config.csv_decimals, stamp);
    let paths = exporter.export_run(&run, &inspectors).context("报表输出失败")?;
    for path in &paths {
        tracing::info!(path = %path.display(), "已输出");
    }

    Ok(())
}

/// 基准日 (当日 00:00)
fn parse_base_date(raw: &str) -> Result<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("基准日格式错误 (YYYY-MM-DD): {}", raw))?;
    date.and_hms_opt(0, 0, 0)
        .with_context(|| format!("基准日无效: {}", raw))
}
