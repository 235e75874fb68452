// ==========================================
// SkillAssignmentEngine 集成测试
// ==========================================
// 测试目标: 验证技能分层分配 (L1 → L2 → L3 → 一般)
// ==========================================


use inspection_scheduler::domain::inspector::{SkillEntry, SkillTable};
use inspection_scheduler::domain::types::{CoverageKind, SkillLevel};
use inspection_scheduler::engine::{DiagnosticKind, SkillAssignmentEngine};
use test_helpers::*;

fn skill(part: &str, worker: &str, level: Option<u8>) -> SkillEntry {
    SkillEntry {
        part_code: part.to_string(),
        worker_name: worker.to_string(),
        skill_level: level.and_then(|l| SkillLevel::from_value(l as f64)),
    }
}

fn skill_table() -> SkillTable {
    SkillTable::from_entries(&[
        skill("P1", "C", Some(2)),
        skill("P1", "A", Some(1)),
        skill("P1", "B", Some(1)),
        skill("P1", "D", None),
    ])
}

fn staff() -> Vec<inspection_scheduler::domain::inspector::Inspector> {
    vec![
        inspector("C", 8, 16),
        inspector("D", 8, 16),
        inspector("A", 8, 16),
        inspector("B", 8, 16),
    ]
}

#[test]
fn test_level_one_workers_selected_first() {
    let engine = SkillAssignmentEngine::new(sink());
    let tasks = vec![prioritized(task("P1", Some(date(2026, 1, 13)), 16.0), 2)];

    let outcome = engine.assign(&tasks, &staff(), &skill_table()).unwrap();
    let result = &outcome.results[0];

    assert!(result.skill_info_available);
    assert_eq!(result.member_names(), vec!["A", "B"]);
    assert!(result
        .assigned_members
        .iter()
        .all(|m| m.coverage == CoverageKind::Skill(SkillLevel::L1)));
}

#[test]
fn test_lower_tiers_fill_remaining_slots() {
    let engine = SkillAssignmentEngine::new(sink());
    let tasks = vec![prioritized(task("P1", Some(date(2026, 1, 13)), 32.0), 4)];

    let outcome = engine.assign(&tasks, &staff(), &skill_table()).unwrap();
    let result = &outcome.results[0];

    assert_eq!(result.member_names(), vec!["A", "B", "C", "D"]);
    assert_eq!(result.assigned_members[2].coverage, CoverageKind::Skill(SkillLevel::L2));
    // 技能为空的作业员只能作为一般补充
    assert_eq!(result.assigned_members[3].coverage, CoverageKind::General);
    assert_eq!(result.shortage_headcount, 0);
}

#[test]
fn test_exhausted_skill_worker_is_skipped() {
    let engine = SkillAssignmentEngine::new(sink());
    let tasks = vec![
        prioritized(task("P1", Some(date(2026, 1, 13)), 7.0), 1),
        prioritized(task("P1", Some(date(2026, 1, 13)), 7.0), 1),
        prioritized(task("P1", Some(date(2026, 1, 13)), 7.0), 1),
    ];

    let outcome = engine.assign(&tasks, &staff(), &skill_table()).unwrap();

    assert_eq!(outcome.results[0].member_names(), vec!["A"]);
    assert_eq!(outcome.results[1].member_names(), vec!["B"]);
    assert_eq!(outcome.results[2].member_names(), vec!["C"]);
    assert_eq!(
        outcome.results[2].assigned_members[0].coverage,
        CoverageKind::Skill(SkillLevel::L2)
    );
}

#[test]
fn test_unknown_part_falls_back_to_general() {
    let sink = sink();
    let engine = SkillAssignmentEngine::new(sink.clone());
    let tasks = vec![prioritized(task("UNKNOWN", Some(date(2026, 1, 13)), 3.0), 1)];

    let outcome = engine.assign(&tasks, &staff(), &skill_table()).unwrap();
    let result = &outcome.results[0];

    assert!(!result.skill_info_available);
    assert_eq!(result.member_names(), vec!["C"]);
    assert_eq!(result.assigned_members[0].coverage, CoverageKind::General);
    assert!(sink.count_of(DiagnosticKind::UnresolvedReference) >= 1);
}

#[test]
fn test_skill_variant_ignores_new_product_team() {
    let engine = SkillAssignmentEngine::new(sink());
    let tasks = vec![prioritized(new_product_task("P1", Some(date(2026, 1, 13)), 2.0), 1)];

    let outcome = engine.assign(&tasks, &staff(), &skill_table()).unwrap();

    assert_eq!(outcome.results[0].member_names(), vec!["A"]);
    assert!(outcome.results[0].is_new_product);
}

#[test]
fn test_pool_is_independent_per_run() {
    let engine = SkillAssignmentEngine::new(sink());
    let tasks = vec![prioritized(task("P1", Some(date(2026, 1, 13)), 8.0), 1)];
    let table = skill_table();

    let first = engine.assign(&tasks, &staff(), &table).unwrap();
    let second = engine.assign(&tasks, &staff(), &table).unwrap();

    assert_eq!(first.results[0].member_names(), second.results[0].member_names());
}
