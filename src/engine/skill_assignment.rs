// ==========================================
// 检查排程系统 - 检查员分配引擎 (技能分层)
// ==========================================
// 红线: 技能 1 → 2 → 3 → 一般, 逐层补足, 不回溯
// ==========================================
// 职责: 以技能表为优先依据分配检查员, 不足部分由一般人员补充
// 输入: PrioritizedTask 列表 (已排序) + 检查员列表 + SkillTable
// 输出: AssignmentResult 列表 (成员带覆盖类型标记)
// ==========================================

use crate::domain::assignment::{AssignedMember, AssignmentResult};
use crate::domain::inspector::{Inspector, SkillTable, DEFAULT_SHIFT_HOURS};
use crate::domain::types::{CoverageKind, SkillLevel};
use crate::engine::assignment::{empty_result, finalize, AssignmentOutcome, StaffingDemand};
use crate::engine::diagnostics::{DiagnosticKind, DiagnosticsSink, Stage};
use crate::engine::error::{Dataset, EngineError, EngineResult};
use crate::engine::inspector_pool::{shift_average, InspectorPool};
use crate::engine::priority::PrioritizedTask;
use std::sync::Arc;
use tracing::instrument;

// ==========================================
// SkillAssignmentEngine - 技能分层分配引擎
// ==========================================
pub struct SkillAssignmentEngine {
    sink: Arc<dyn DiagnosticsSink>,
    default_shift_hours: f64,
}

impl SkillAssignmentEngine {
    pub fn new(sink: Arc<dyn DiagnosticsSink>) -> Self {
        Self::with_default_shift(sink, DEFAULT_SHIFT_HOURS)
    }

    pub fn with_default_shift(sink: Arc<dyn DiagnosticsSink>, default_shift_hours: f64) -> Self {
        Self {
            sink,
            default_shift_hours,
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 执行技能分层分配
    ///
    /// 时间池独立于数量驱动分配, 本次运行开始时重置
    #[instrument(skip(self, tasks, inspectors, skills), fields(
        tasks_count = tasks.len(),
        inspectors_count = inspectors.len(),
        skill_parts = skills.part_count()
    ))]
    pub fn assign(
        &self,
        tasks: &[PrioritizedTask],
        inspectors: &[Inspector],
        skills: &SkillTable,
    ) -> EngineResult<AssignmentOutcome> {
        if inspectors.is_empty() {
            self.sink.emit(
                DiagnosticKind::MissingData,
                Stage::SkillAssignment,
                "检查员主数据为空, 跳过技能分配".to_string(),
            );
            return Err(EngineError::MissingData {
                dataset: Dataset::Inspectors,
            });
        }

        if skills.is_empty() {
            self.sink.emit(
                DiagnosticKind::UnresolvedReference,
                Stage::SkillAssignment,
                "技能表为空, 全部任务改为一般分配".to_string(),
            );
        }

        let shift_avg = shift_average(inspectors, self.default_shift_hours);
        let mut pool = InspectorPool::new(inspectors, shift_avg);

        let results: Vec<AssignmentResult> = tasks
            .iter()
            .map(|task| self.assign_single(task, &mut pool, skills, shift_avg))
            .collect();

        let skill_matched = results.iter().filter(|r| r.skill_info_available).count();
        tracing::info!(
            shift_avg,
            skill_matched,
            total_tasks = results.len(),
            shortage = results.iter().map(|r| r.shortage_headcount).sum::<u32>(),
            "技能分配完成"
        );

        Ok(AssignmentOutcome {
            results,
            final_states: pool.states(),
            shift_average: shift_avg,
        })
    }

    /// 单任务分配 (会修改时间池)
    pub fn assign_single(
        &self,
        prioritized: &PrioritizedTask,
        pool: &mut InspectorPool,
        skills: &SkillTable,
        shift_avg: f64,
    ) -> AssignmentResult {
        let task = &prioritized.task;
        let total = task.total_inspection_hours;
        let mut result = empty_result(prioritized);
        result.skill_info_available = skills.contains_part(&task.part_code);

        if !total.is_finite() || total <= 0.0 {
            return result;
        }

        if !result.skill_info_available {
            self.sink.emit(
                DiagnosticKind::UnresolvedReference,
                Stage::SkillAssignment,
                format!("品番 {} 不在技能表中, 仅做一般分配", task.part_code),
            );
        }

        let demand = StaffingDemand::new(total, prioritized.required_headcount, shift_avg);
        let target = demand.effective_required as usize;
        let per_member = demand.hours_per_member(total, shift_avg);
        let mut selected: Vec<usize> = Vec::new();

        // 1) 技能层
        for level in SkillLevel::all() {
            if selected.len() >= target {
                break;
            }
            let mut tier: Vec<usize> = skills
                .workers_at_level(&task.part_code, level)
                .into_iter()
                .filter_map(|name| pool.index_of(name))
                .filter(|idx| !selected.contains(idx))
                .filter(|idx| demand.qualifies(pool.remaining(*idx), total, shift_avg))
                .collect();
            pool.sort_by_remaining(&mut tier);

            for index in tier.into_iter().take(target - selected.len()) {
                self.take(pool, &mut result, &mut selected, index, per_member, CoverageKind::Skill(level));
            }
        }

        // 2) 一般补充
        if selected.len() < target {
            let fallback = pool.ranked_candidates(|e| demand.qualifies(e.remaining_hours, total, shift_avg));
            let fallback: Vec<usize> = fallback
                .into_iter()
                .filter(|idx| !selected.contains(idx))
                .take(target - selected.len())
                .collect();
            for index in fallback {
                self.take(pool, &mut result, &mut selected, index, per_member, CoverageKind::General);
            }
        }

        finalize(&mut result, demand.effective_required);

        if result.shortage_headcount > 0 {
            self.sink.emit(
                DiagnosticKind::CapacityShortfall,
                Stage::SkillAssignment,
                format!(
                    "品番 {}: 技能与一般分配后仍缺少 {}/{} 名检查员",
                    task.part_code, result.shortage_headcount, demand.effective_required
                ),
            );
        }

        result
    }

    fn take(
        &self,
        pool: &mut InspectorPool,
        result: &mut AssignmentResult,
        selected: &mut Vec<usize>,
        index: usize,
        hours: f64,
        coverage: CoverageKind,
    ) {
        let consumed = pool.consume(index, hours);
        if let Some(entry) = pool.entry(index) {
            result.assigned_members.push(AssignedMember {
                name: entry.name.clone(),
                coverage,
                allocated_hours: consumed,
            });
            selected.push(index);
        }
    }
}
