// ==========================================
// 报表输出集成测试
// ==========================================
// 测试目标: 文件导入 → 排程 → CSV 报表 的完整流程
// ==========================================


use inspection_scheduler::config::{DataFiles, SchedulerConfig};
use inspection_scheduler::domain::{ProcessMasterEntry, ShortageRecord};
use inspection_scheduler::engine::{InspectionScheduler, ProcessReconciler, DEFAULT_INSPECTION_HOURS};
use inspection_scheduler::importer::DatasetLoader;
use inspection_scheduler::report::{CsvExporter, ReportKind};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use test_helpers::*;

fn prepare_data(dir: &Path) {
    fs::write(
        dir.join("shortage.csv"),
        "納期,品番,不足数,現在工程番号\n2026-01-16,P1,-8,1\n2026-01-19,NEW,-3,\n",
    )
    .unwrap();
    fs::write(
        dir.join("product_master.csv"),
        "品番,工程番号,検査時間\nP1,1,60\nP1,2,30\n",
    )
    .unwrap();
    fs::write(
        dir.join("inspectors.csv"),
        "氏名,開始時刻,終了時刻,所属グループ\n山田,08:00,16:00,G1\n佐藤,08:00,16:00,G1\n",
    )
    .unwrap();
    fs::write(dir.join("skills.csv"), "品番,品名,山田,佐藤\nP1,部品1,2,1\n").unwrap();
}

fn read_csv(path: &Path) -> Vec<String> {
    let raw = fs::read_to_string(path).unwrap();
    raw.trim_start_matches('\u{feff}')
        .lines()
        .map(|l| l.to_string())
        .collect()
}

#[test]
fn test_export_full_run() {
    let data = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    prepare_data(data.path());

    let mut config = SchedulerConfig::default();
    config.data_files = DataFiles {
        data_dir: data.path().to_path_buf(),
        shortage_file: "shortage.csv".to_string(),
        product_master_file: "product_master.csv".to_string(),
        inspector_file: "inspectors.csv".to_string(),
        skill_file: "skills.csv".to_string(),
    };
    config.output_dir = out.path().join("reports");
    config.timestamp_outputs = false;

    let sink = sink();
    let inputs = DatasetLoader::new(config.data_files.clone(), sink.clone())
        .load_all()
        .unwrap();
    let inspectors = inputs.inspectors.clone();
    let config = Arc::new(config);
    let run = InspectionScheduler::new(config.clone(), sink)
        .run(inputs, at(2026, 1, 12, 8))
        .unwrap();

    let exporter = CsvExporter::new(&config.output_dir, config.csv_decimals, None);
    let paths = exporter.export_run(&run, &inspectors).unwrap();

    assert_eq!(paths.len(), 8);
    assert!(paths.iter().all(|p| p.exists()));

    // 检查排程一览: 表头 + 2 任务
    let schedule = read_csv(&exporter.path_for(ReportKind::Schedule));
    assert_eq!(schedule.len(), 3);
    assert!(schedule[1].starts_with("P1,2026-01-16,1,\"1,2\",-8.00,8.00,1.00,MASTER,8.00,2026-01-15 00:00,2,2,"));

    // 数量驱动分配: 新制品无团队 → NG
    let assignment = read_csv(&exporter.path_for(ReportKind::Assignment));
    let new_row = assignment.iter().find(|l| l.starts_with("NEW,")).unwrap();
    assert!(new_row.contains(",NG,"));

    // 技能分配: 佐藤 (技能1) 优先
    let skill_members = read_csv(&exporter.path_for(ReportKind::SkillMemberDetail));
    assert!(skill_members[1].starts_with("P1,2026-01-16,1,佐藤,SKILL1,"));
}

#[test]
fn test_schedule_new_product_process_columns() {
    let out = TempDir::new().unwrap();
    let reconciler = ProcessReconciler::new(sink(), DEFAULT_INSPECTION_HOURS);
    let shortage = ShortageRecord {
        due_date: Some(date(2026, 1, 16)),
        part_code: "NEW".to_string(),
        shipment_qty: 3.0,
        shortage_qty: -3.0,
        lot_id: None,
        lot_qty: None,
        current_process_number: Some("7".to_string()),
    };
    let master = vec![ProcessMasterEntry {
        part_code: "P1".to_string(),
        process_number: Some("1".to_string()),
        inspection_time_hours: 1.0,
    }];
    let tasks = reconciler.reconcile(vec![shortage], &master);

    let exporter = CsvExporter::new(out.path(), 2, None);
    let path = exporter.export_schedule(ReportKind::Schedule, &tasks).unwrap();
    let schedule = read_csv(&path);

    // 现在工程号在第 3 列, 标准工程号一览为空
    assert!(schedule[1].starts_with("NEW,2026-01-16,7,,-3.00,"));
}
