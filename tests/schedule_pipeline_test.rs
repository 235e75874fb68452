// ==========================================
// InspectionScheduler 端到端测试
// ==========================================
// 测试目标: 单位判定 → 对账 → 期限 → 排序 → 分配 → 汇总 的数据流
// 覆盖范围: 正常流程、必须数据缺失、检查员缺失、单位强制
// ==========================================


use inspection_scheduler::config::SchedulerConfig;
use inspection_scheduler::domain::shortage::{RawProcessMasterRow, ShortageRecord};
use inspection_scheduler::domain::types::{InspectionTimeSource, TimeUnit, UrgencyLevel};
use inspection_scheduler::engine::{
    CoverageStatus, Dataset, DiagnosticKind, EngineError, InspectionScheduler, MemorySink, ScheduleInputs, Stage,
};
use std::sync::Arc;
use test_helpers::*;

// ==========================================
// 测试数据
// ==========================================

fn shortage(part: &str, due: Option<(i32, u32, u32)>, qty: f64, process: Option<&str>) -> ShortageRecord {
    ShortageRecord {
        due_date: due.map(|(y, m, d)| date(y, m, d)),
        part_code: part.to_string(),
        shipment_qty: qty.abs(),
        shortage_qty: qty,
        lot_id: None,
        lot_qty: None,
        current_process_number: process.map(|p| p.to_string()),
    }
}

fn master(part: &str, process: Option<&str>, minutes: f64) -> RawProcessMasterRow {
    RawProcessMasterRow {
        part_code: part.to_string(),
        process_number: process.map(|p| p.to_string()),
        inspection_time_raw: minutes,
    }
}

fn inputs() -> ScheduleInputs {
    ScheduleInputs {
        shortages: vec![
            // 8 × 1.0h = 8h, 纳期 周五
            shortage("P1", Some((2026, 1, 16)), -8.0, Some("2.0")),
            // 主数据无 → 新制品, 4 × 2.0h
            shortage("P2", Some((2026, 1, 30)), -4.0, None),
            // 工程 5 不存在 → 空白工程平均 0.5h
            shortage("P3", None, -2.0, Some("5")),
        ],
        master_rows: vec![
            master("P1", Some("1"), 30.0),
            master("P1", Some("2"), 60.0),
            master("P3", None, 30.0),
        ],
        inspectors: vec![inspector("A", 8, 17), team_inspector("T", 8, 17)],
        skills: Vec::new(),
    }
}

fn scheduler(config: SchedulerConfig) -> (InspectionScheduler, Arc<MemorySink>) {
    let sink = sink();
    (InspectionScheduler::new(Arc::new(config), sink.clone()), sink)
}

// ==========================================
// 测试用例
// ==========================================

#[test]
fn test_full_pipeline() {
    let (scheduler, sink) = scheduler(SchedulerConfig::default());
    // 2026-01-12 为周一
    let run = scheduler.run(inputs(), at(2026, 1, 12, 8)).unwrap();

    assert!(!run.run_id.is_empty());
    assert_eq!(run.unit_decision.unit, TimeUnit::Minutes);
    assert!(!run.unit_decision.forced);

    // 一览顺序: 紧急度 → 距期限
    let parts: Vec<&str> = run.tasks.iter().map(|t| t.part_code.as_str()).collect();
    assert_eq!(parts, vec!["P1", "P2", "P3"]);

    let p1 = &run.tasks[0];
    assert_eq!(p1.inspection_time_hours, 1.0);
    assert_eq!(p1.inspection_time_source, InspectionTimeSource::Master);
    assert_eq!(p1.total_inspection_hours, 8.0);
    assert_eq!(p1.current_process_number.as_deref(), Some("2.0"));
    assert_eq!(p1.process_number_list, vec!["1".to_string(), "2".to_string()]);
    assert_eq!(p1.inspection_start_deadline, Some(at(2026, 1, 15, 0)));
    assert_eq!(p1.days_until_deadline, 2);
    assert_eq!(p1.urgency_level, UrgencyLevel::L2);

    let p2 = &run.tasks[1];
    assert!(p2.is_new_product);
    assert_eq!(p2.inspection_time_source, InspectionTimeSource::Default);
    assert_eq!(p2.total_inspection_hours, 8.0);
    assert_eq!(p2.inspection_start_deadline, Some(at(2026, 1, 29, 0)));
    assert_eq!(p2.urgency_level, UrgencyLevel::L4);

    let p3 = &run.tasks[2];
    assert_eq!(p3.inspection_time_source, InspectionTimeSource::UndefinedProcessAverage);
    assert_eq!(p3.total_inspection_hours, 1.0);
    assert_eq!(p3.inspection_start_deadline, None);
    assert_eq!(p3.days_until_deadline, 999);

    // 紧急任务 (≤ 3 日)
    assert_eq!(run.urgent_tasks.len(), 1);
    assert_eq!(run.urgent_tasks[0].part_code, "P1");

    // 数量驱动分配: 勤务平均 9h
    let assignment = &run.assignment;
    assert_eq!(assignment.shift_average, 9.0);
    assert_eq!(assignment.results[0].member_names(), vec!["A"]);
    assert_eq!(assignment.results[1].member_names(), vec!["T"]);
    assert_eq!(assignment.results[2].member_names(), vec!["A"]);
    assert_eq!(assignment.total_shortage(), 0);

    // 汇总
    assert_eq!(run.schedule_summary.total_tasks, 3);
    assert_eq!(run.schedule_summary.urgent_count, 1);
    assert_eq!(run.schedule_summary.normal_count, 2);
    assert_eq!(run.capacity.inspector_count, 2);
    assert_eq!(run.capacity.new_product_team_count, 1);
    assert_eq!(run.workloads[0].name, "A");
    assert_eq!(run.workloads[0].task_count, 2);
    assert_eq!(run.workloads[0].total_hours, 9.0);
    assert_eq!(run.new_product_coverage.new_product_tasks, 1);
    assert_eq!(run.new_product_coverage.ok_count, 1);
    assert_eq!(run.skill_coverage.skill_matched_tasks, 0);

    // 技能表为空 → 全部一般分配
    assert_eq!(run.skill_assignment.results.len(), 3);
    assert_eq!(run.skill_assignment.total_shortage(), 0);

    assert!(sink.has(DiagnosticKind::UnresolvedReference, Stage::ProcessReconciler));
    assert!(sink.has(DiagnosticKind::DegradedFill, Stage::ProcessReconciler));
}

#[test]
fn test_same_day_single_first_ordering_is_configurable() {
    let mut config = SchedulerConfig::default();
    config.assignment_ordering = inspection_scheduler::domain::types::AssignmentOrdering::SameDaySingleFirst;
    let (scheduler, _) = scheduler(config);

    let mut data = inputs();
    // 今日纳期的单人任务排在最前
    data.shortages.push(shortage("P1", Some((2026, 1, 12)), -1.0, Some("1")));
    let run = scheduler.run(data, at(2026, 1, 12, 8)).unwrap();

    assert_eq!(run.assignment.results[0].due_date, Some(date(2026, 1, 12)));
    assert_eq!(run.assignment.results[0].part_code, "P1");
}

#[test]
fn test_forced_time_unit() {
    let mut config = SchedulerConfig::default();
    config.product_master_time_unit = Some("hours".to_string());
    let (scheduler, _) = scheduler(config);

    let run = scheduler.run(inputs(), at(2026, 1, 12, 8)).unwrap();

    assert!(run.unit_decision.forced);
    assert_eq!(run.unit_decision.unit, TimeUnit::Hours);
    assert_eq!(run.tasks.iter().find(|t| t.part_code == "P1").unwrap().inspection_time_hours, 60.0);
}

#[test]
fn test_missing_shortage_data() {
    let (scheduler, sink) = scheduler(SchedulerConfig::default());
    let mut data = inputs();
    data.shortages.clear();

    let result = scheduler.run(data, at(2026, 1, 12, 8));

    assert!(matches!(
        result,
        Err(EngineError::MissingData { dataset: Dataset::Shortage })
    ));
    assert!(sink.has(DiagnosticKind::MissingData, Stage::Orchestrator));
}

#[test]
fn test_missing_master_data() {
    let (scheduler, _) = scheduler(SchedulerConfig::default());
    let mut data = inputs();
    data.master_rows.clear();

    assert!(matches!(
        scheduler.run(data, at(2026, 1, 12, 8)),
        Err(EngineError::MissingData { dataset: Dataset::ProcessMaster })
    ));
}

#[test]
fn test_empty_inspectors_leaves_assignment_tables_empty() {
    let (scheduler, _) = scheduler(SchedulerConfig::default());
    let mut data = inputs();
    data.inspectors.clear();

    let run = scheduler.run(data, at(2026, 1, 12, 8)).unwrap();

    assert_eq!(run.tasks.len(), 3);
    assert!(run.assignment.results.is_empty());
    assert!(run.skill_assignment.results.is_empty());
    assert!(run.workloads.is_empty());
    assert_eq!(run.new_product_coverage.new_product_tasks, 0);
}

#[test]
fn test_new_product_without_team_reports_ng() {
    let (scheduler, _) = scheduler(SchedulerConfig::default());
    let mut data = inputs();
    data.inspectors = vec![inspector("A", 8, 17), inspector("B", 8, 17)];

    let run = scheduler.run(data, at(2026, 1, 12, 8)).unwrap();
    let p2 = run
        .assignment
        .results
        .iter()
        .find(|r| r.part_code == "P2")
        .unwrap();

    assert_eq!(p2.assigned_headcount, 0);
    assert_eq!(run.new_product_coverage.ng_count, 1);
    assert_eq!(run.new_product_coverage.ng_parts, vec!["P2".to_string()]);
    assert_ne!(
        inspection_scheduler::engine::team_coverage_status(p2, &Default::default()),
        Some(CoverageStatus::Ok)
    );
}
