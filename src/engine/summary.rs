// ==========================================
// 检查排程系统 - 汇总统计
// ==========================================
// 职责: 排程概要 / 检查员资源分析 / 检查员负荷 / 新制品团队覆盖 / 技能覆盖
// 说明: 纯计算, 不修改输入
// ==========================================

use crate::domain::assignment::AssignmentResult;
use crate::domain::inspector::Inspector;
use crate::domain::task::ReconciledTask;
use crate::domain::types::{CoverageKind, UrgencyLevel};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

// ==========================================
// ScheduleSummary - 排程概要
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub total_tasks: usize,
    pub critical_count: usize, // 紧急度 1
    pub urgent_count: usize,   // 紧急度 2
    pub caution_count: usize,  // 紧急度 3
    pub normal_count: usize,   // 紧急度 4
    pub total_inspection_hours: f64,
    pub average_inspection_time_hours: f64, // 单件检查时间平均
    pub overdue_count: usize,               // 距期限 < 0
    pub average_days_until_deadline: f64,   // 含 999 哨兵值
}

impl ScheduleSummary {
    pub fn from_tasks(tasks: &[ReconciledTask]) -> Self {
        let count_level = |level: UrgencyLevel| tasks.iter().filter(|t| t.urgency_level == level).count();
        let n = tasks.len();

        Self {
            total_tasks: n,
            critical_count: count_level(UrgencyLevel::L1),
            urgent_count: count_level(UrgencyLevel::L2),
            caution_count: count_level(UrgencyLevel::L3),
            normal_count: count_level(UrgencyLevel::L4),
            total_inspection_hours: tasks.iter().map(|t| t.total_inspection_hours).sum(),
            average_inspection_time_hours: mean(tasks.iter().map(|t| t.inspection_time_hours)),
            overdue_count: tasks.iter().filter(|t| t.days_until_deadline < 0).count(),
            average_days_until_deadline: mean(tasks.iter().map(|t| t.days_until_deadline as f64)),
        }
    }

    /// 指定紧急度的件数
    pub fn count_for(&self, level: UrgencyLevel) -> usize {
        match level {
            UrgencyLevel::L1 => self.critical_count,
            UrgencyLevel::L2 => self.urgent_count,
            UrgencyLevel::L3 => self.caution_count,
            UrgencyLevel::L4 => self.normal_count,
        }
    }
}

impl fmt::Display for ScheduleSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tasks={} L1={} L2={} L3={} L4={} total_hours={:.2} overdue={} avg_days={:.1}",
            self.total_tasks,
            self.critical_count,
            self.urgent_count,
            self.caution_count,
            self.normal_count,
            self.total_inspection_hours,
            self.overdue_count,
            self.average_days_until_deadline
        )
    }
}

// ==========================================
// CapacityAnalysis - 检查员资源分析
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityAnalysis {
    pub inspector_count: usize,
    pub group_counts: BTreeMap<String, usize>,
    pub shift_average_hours: f64,
    pub shift_max_hours: f64,
    pub shift_min_hours: f64,
    pub new_product_team_count: usize,
}

impl CapacityAnalysis {
    pub fn from_inspectors(inspectors: &[Inspector]) -> Self {
        let mut group_counts = BTreeMap::new();
        for inspector in inspectors {
            if let Some(group) = inspector.group.as_ref().filter(|g| !g.trim().is_empty()) {
                *group_counts.entry(group.trim().to_string()).or_insert(0) += 1;
            }
        }

        let lengths: Vec<f64> = inspectors.iter().map(|i| i.shift_length_hours()).collect();
        let (max, min) = if lengths.is_empty() {
            (0.0, 0.0)
        } else {
            (
                lengths.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                lengths.iter().copied().fold(f64::INFINITY, f64::min),
            )
        };

        Self {
            inspector_count: inspectors.len(),
            group_counts,
            shift_average_hours: mean(lengths.iter().copied()),
            shift_max_hours: max,
            shift_min_hours: min,
            new_product_team_count: inspectors.iter().filter(|i| i.is_new_product_team).count(),
        }
    }
}

// ==========================================
// InspectorWorkload - 检查员负荷
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectorWorkload {
    pub name: String,
    pub task_count: usize,
    pub total_hours: f64,
    pub average_hours: f64,
}

/// 检查员负荷汇总
///
/// 任务时间在成员之间均分; 结果按总时间降序, 同值按名称
pub fn inspector_workloads(results: &[AssignmentResult]) -> Vec<InspectorWorkload> {
    let mut acc: BTreeMap<String, (usize, f64)> = BTreeMap::new();

    for result in results {
        let members = result.member_names();
        if members.is_empty() {
            continue;
        }
        let share = result.total_inspection_hours / members.len() as f64;
        for name in members {
            let slot = acc.entry(name.to_string()).or_insert((0, 0.0));
            slot.0 += 1;
            slot.1 += share;
        }
    }

    let mut workloads: Vec<InspectorWorkload> = acc
        .into_iter()
        .map(|(name, (task_count, total_hours))| InspectorWorkload {
            name,
            task_count,
            total_hours,
            average_hours: total_hours / task_count as f64,
        })
        .collect();
    workloads.sort_by(|a, b| b.total_hours.total_cmp(&a.total_hours).then_with(|| a.name.cmp(&b.name)));
    workloads
}

// ==========================================
// NewProductCoverage - 新制品团队覆盖检查
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoverageStatus {
    Ok,
    Ng,
}

impl fmt::Display for CoverageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoverageStatus::Ok => write!(f, "OK"),
            CoverageStatus::Ng => write!(f, "NG"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProductCoverage {
    pub total_tasks: usize,
    pub new_product_tasks: usize,
    pub assigned_new_product_tasks: usize,
    pub ok_count: usize,
    pub ng_count: usize,
    pub ng_parts: Vec<String>,
}

/// 新制品任务是否至少有一名新制品团队成员; 非新制品任务 → None
pub fn team_coverage_status(result: &AssignmentResult, team: &HashSet<&str>) -> Option<CoverageStatus> {
    if !result.is_new_product {
        return None;
    }
    if result.member_names().iter().any(|m| team.contains(m)) {
        Some(CoverageStatus::Ok)
    } else {
        Some(CoverageStatus::Ng)
    }
}

impl NewProductCoverage {
    pub fn evaluate(results: &[AssignmentResult], inspectors: &[Inspector]) -> Self {
        let team: HashSet<&str> = inspectors
            .iter()
            .filter(|i| i.is_new_product_team)
            .map(|i| i.name.as_str())
            .collect();

        let mut coverage = NewProductCoverage {
            total_tasks: results.len(),
            new_product_tasks: 0,
            assigned_new_product_tasks: 0,
            ok_count: 0,
            ng_count: 0,
            ng_parts: Vec::new(),
        };

        for result in results.iter().filter(|r| r.is_new_product) {
            coverage.new_product_tasks += 1;
            if result.assigned_headcount > 0 {
                coverage.assigned_new_product_tasks += 1;
            }
            match team_coverage_status(result, &team) {
                Some(CoverageStatus::Ok) => coverage.ok_count += 1,
                Some(CoverageStatus::Ng) => {
                    coverage.ng_count += 1;
                    coverage.ng_parts.push(result.part_code.clone());
                }
                None => {}
            }
        }

        coverage
    }
}

// ==========================================
// SkillCoverageStats - 技能覆盖统计
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillCoverageStats {
    pub total_tasks: usize,
    pub skill_matched_tasks: usize,
    pub fully_assigned_tasks: usize,
    pub level1_members: usize,
    pub level2_members: usize,
    pub level3_members: usize,
    pub general_members: usize,
}

impl SkillCoverageStats {
    pub fn from_results(results: &[AssignmentResult]) -> Self {
        let mut stats = SkillCoverageStats {
            total_tasks: results.len(),
            skill_matched_tasks: results.iter().filter(|r| r.skill_info_available).count(),
            fully_assigned_tasks: results.iter().filter(|r| r.is_fully_assigned()).count(),
            level1_members: 0,
            level2_members: 0,
            level3_members: 0,
            general_members: 0,
        };

        for member in results.iter().flat_map(|r| r.assigned_members.iter()) {
            match member.coverage {
                CoverageKind::Skill(level) => match level.as_number() {
                    1 => stats.level1_members += 1,
                    2 => stats.level2_members += 1,
                    _ => stats.level3_members += 1,
                },
                CoverageKind::General => stats.general_members += 1,
                CoverageKind::Volume => {}
            }
        }

        stats
    }
}

fn mean<I: Iterator<Item = f64>>(values: I) -> f64 {
    let (sum, n) = values
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 {
        0.0
    } else {
        sum / n as f64
    }
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::assignment::AssignedMember;
    use crate::domain::types::{InspectionTimeSource, SkillLevel};

    fn result(part: &str, total: f64, members: &[(&str, CoverageKind)], new_product: bool) -> AssignmentResult {
        AssignmentResult {
            part_code: part.to_string(),
            process_number: None,
            process_number_list: vec![],
            due_date: None,
            total_inspection_hours: total,
            required_headcount: members.len().max(1) as u32,
            assigned_headcount: members.len() as u32,
            shortage_headcount: if members.is_empty() { 1 } else { 0 },
            assigned_members: members
                .iter()
                .map(|(n, c)| AssignedMember {
                    name: n.to_string(),
                    coverage: *c,
                    allocated_hours: 0.0,
                })
                .collect(),
            is_new_product: new_product,
            skill_info_available: members.iter().any(|(_, c)| matches!(c, CoverageKind::Skill(_))),
        }
    }

    #[test]
    fn test_workload_splits_hours_evenly() {
        let results = vec![
            result("P1", 16.0, &[("A", CoverageKind::Volume), ("B", CoverageKind::Volume)], false),
            result("P2", 3.0, &[("A", CoverageKind::Volume)], false),
            result("P3", 5.0, &[], false),
        ];
        let workloads = inspector_workloads(&results);

        assert_eq!(workloads.len(), 2);
        assert_eq!(workloads[0].name, "A");
        assert_eq!(workloads[0].task_count, 2);
        assert_eq!(workloads[0].total_hours, 11.0);
        assert_eq!(workloads[0].average_hours, 5.5);
        assert_eq!(workloads[1].total_hours, 8.0);
    }

    #[test]
    fn test_new_product_coverage() {
        let mut team_member = Inspector::new("T", None, None);
        team_member.is_new_product_team = true;
        let inspectors = vec![team_member, Inspector::new("A", None, None)];

        let results = vec![
            result("N1", 2.0, &[("T", CoverageKind::Volume)], true),
            result("N2", 2.0, &[("A", CoverageKind::Volume)], true),
            result("N3", 2.0, &[], true),
            result("P1", 2.0, &[("A", CoverageKind::Volume)], false),
        ];
        let coverage = NewProductCoverage::evaluate(&results, &inspectors);

        assert_eq!(coverage.new_product_tasks, 3);
        assert_eq!(coverage.assigned_new_product_tasks, 2);
        assert_eq!(coverage.ok_count, 1);
        assert_eq!(coverage.ng_count, 2);
        assert_eq!(coverage.ng_parts, vec!["N2".to_string(), "N3".to_string()]);
    }

    #[test]
    fn test_skill_coverage_stats() {
        let results = vec![
            result(
                "P1",
                16.0,
                &[("A", CoverageKind::Skill(SkillLevel::L1)), ("C", CoverageKind::General)],
                false,
            ),
            result("P2", 2.0, &[("B", CoverageKind::Skill(SkillLevel::L2))], false),
        ];
        let stats = SkillCoverageStats::from_results(&results);
        assert_eq!(stats.skill_matched_tasks, 2);
        assert_eq!(stats.level1_members, 1);
        assert_eq!(stats.level2_members, 1);
        assert_eq!(stats.general_members, 1);
        assert_eq!(stats.fully_assigned_tasks, 2);
    }

    #[test]
    fn test_schedule_summary() {
        let make = |level, days, hours| ReconciledTask {
            part_code: "P".to_string(),
            due_date: None,
            current_process_number: None,
            process_number_list: vec![],
            inspection_time_hours: 0.5,
            inspection_time_source: InspectionTimeSource::Master,
            shortage_qty: 0.0,
            produced_quantity: 0.0,
            total_inspection_hours: hours,
            inspection_start_deadline: None,
            urgency_level: level,
            days_until_deadline: days,
            is_new_product: false,
        };
        let summary = ScheduleSummary::from_tasks(&[
            make(UrgencyLevel::L1, -2, 4.0),
            make(UrgencyLevel::L1, 0, 2.0),
            make(UrgencyLevel::L4, 20, 1.0),
        ]);

        assert_eq!(summary.total_tasks, 3);
        assert_eq!(summary.count_for(UrgencyLevel::L1), 2);
        assert_eq!(summary.normal_count, 1);
        assert_eq!(summary.overdue_count, 1);
        assert_eq!(summary.total_inspection_hours, 7.0);
        assert_eq!(summary.average_days_until_deadline, 6.0);
        assert_eq!(summary.average_inspection_time_hours, 0.5);

        let empty = ScheduleSummary::from_tasks(&[]);
        assert_eq!(empty.total_tasks, 0);
        assert_eq!(empty.average_days_until_deadline, 0.0);
    }

    #[test]
    fn test_capacity_analysis() {
        let mut a = Inspector::new("A", chrono::NaiveTime::from_hms_opt(8, 0, 0), chrono::NaiveTime::from_hms_opt(17, 0, 0));
        a.group = Some("G1".to_string());
        let mut b = Inspector::new("B", chrono::NaiveTime::from_hms_opt(8, 0, 0), chrono::NaiveTime::from_hms_opt(15, 0, 0));
        b.group = Some("G1".to_string());
        b.is_new_product_team = true;

        let analysis = CapacityAnalysis::from_inspectors(&[a, b]);
        assert_eq!(analysis.inspector_count, 2);
        assert_eq!(analysis.group_counts.get("G1"), Some(&2));
        assert_eq!(analysis.shift_average_hours, 8.0);
        assert_eq!(analysis.shift_max_hours, 9.0);
        assert_eq!(analysis.shift_min_hours, 7.0);
        assert_eq!(analysis.new_product_team_count, 1);
    }
}
