// ==========================================
// 检查排程系统 - 检查员分配引擎 (数量驱动)
// ==========================================
// 红线: 贪心分配, 不回溯, 不重试
// 红线: 新制品任务仅从新制品团队中选人, 不足不从一般人员补充
// ==========================================
// 职责: 按优先顺序逐个任务从时间池中分配检查员
// 输入: PrioritizedTask 列表 (已排序) + 检查员列表
// 输出: AssignmentResult 列表 + 运行结束时的时间池快照
// ==========================================

use crate::domain::assignment::{AssignedMember, AssignmentResult};
use crate::domain::inspector::{Inspector, InspectorRuntimeState, DEFAULT_SHIFT_HOURS};
use crate::domain::types::CoverageKind;
use crate::engine::diagnostics::{DiagnosticKind, DiagnosticsSink, Stage};
use crate::engine::error::{Dataset, EngineError, EngineResult};
use crate::engine::inspector_pool::{shift_average, InspectorPool, PoolEntry};
use crate::engine::priority::PrioritizedTask;
use std::sync::Arc;
use tracing::instrument;

// ==========================================
// 分配运行结果
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentOutcome {
    pub results: Vec<AssignmentResult>,
    pub final_states: Vec<InspectorRuntimeState>,
    pub shift_average: f64,
}

impl AssignmentOutcome {
    pub fn total_shortage(&self) -> u32 {
        self.results.iter().map(|r| r.shortage_headcount).sum()
    }
}

/// 单任务人员需求
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaffingDemand {
    pub single_person: bool,
    pub effective_required: u32,
}

impl StaffingDemand {
    /// effective = min(所需人数, max(1, ceil(总时间 / 勤务平均)))
    pub fn new(total_hours: f64, required_headcount: u32, shift_avg: f64) -> Self {
        let single_person = required_headcount <= 1;
        let by_volume = (total_hours / shift_avg.max(0.1)).ceil().max(1.0);
        let effective_required = if single_person {
            1
        } else if by_volume >= required_headcount as f64 {
            required_headcount
        } else {
            by_volume as u32
        };
        Self {
            single_person,
            effective_required,
        }
    }

    /// 候选资格: 单人 → 剩余 ≥ 总时间; 多人 → 剩余 ≥ 勤务平均
    pub fn qualifies(&self, remaining_hours: f64, total_hours: f64, shift_avg: f64) -> bool {
        if self.single_person {
            remaining_hours >= total_hours
        } else {
            remaining_hours >= shift_avg
        }
    }

    /// 每名成员扣减的时间
    pub fn hours_per_member(&self, total_hours: f64, shift_avg: f64) -> f64 {
        if self.single_person {
            total_hours
        } else {
            shift_avg
        }
    }
}

// ==========================================
// AssignmentEngine - 数量驱动分配引擎
// ==========================================
pub struct AssignmentEngine {
    sink: Arc<dyn DiagnosticsSink>,
    default_shift_hours: f64,
}

impl AssignmentEngine {
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

    /// 执行分配
    ///
    /// 规则:
    /// 1) 全员预算 = 勤务平均, 每次运行重置
    /// 2) 总时间 ≤ 0 → 跳过 (不足 0)
    /// 3) 单人: 剩余时间降序中首个 剩余 ≥ 总时间 的检查员
    /// 4) 多人: 剩余 ≥ 勤务平均 的前 effective 名, 各扣一个勤务
    /// 5) 新制品: 候选限于新制品团队
    #[instrument(skip(self, tasks, inspectors), fields(
        tasks_count = tasks.len(),
        inspectors_count = inspectors.len()
    ))]
    pub fn assign(
        &self,
        tasks: &[PrioritizedTask],
        inspectors: &[Inspector],
    ) -> EngineResult<AssignmentOutcome> {
        if inspectors.is_empty() {
            self.sink.emit(
                DiagnosticKind::MissingData,
                Stage::Assignment,
                "检查员主数据为空, 跳过分配".to_string(),
            );
            return Err(EngineError::MissingData {
                dataset: Dataset::Inspectors,
            });
        }

        let shift_avg = shift_average(inspectors, self.default_shift_hours);
        let mut pool = InspectorPool::new(inspectors, shift_avg);

        if !pool.has_new_product_team() && tasks.iter().any(|t| t.task.is_new_product) {
            self.sink.emit(
                DiagnosticKind::CapacityShortfall,
                Stage::Assignment,
                "存在新制品任务, 但没有检查员属于新制品团队".to_string(),
            );
        }

        let results: Vec<AssignmentResult> = tasks
            .iter()
            .map(|task| self.assign_single(task, &mut pool, shift_avg))
            .collect();

        let assigned_tasks = results.iter().filter(|r| r.assigned_headcount > 0).count();
        tracing::info!(
            shift_avg,
            assigned_tasks,
            total_tasks = results.len(),
            shortage = results.iter().map(|r| r.shortage_headcount).sum::<u32>(),
            "检查员分配完成"
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
        shift_avg: f64,
    ) -> AssignmentResult {
        let task = &prioritized.task;
        let total = task.total_inspection_hours;
        let mut result = empty_result(prioritized);

        if !total.is_finite() || total <= 0.0 {
            return result;
        }

        let demand = StaffingDemand::new(total, prioritized.required_headcount, shift_avg);
        let team_only = task.is_new_product;

        let candidates = pool.ranked_candidates(|e: &PoolEntry| {
            (!team_only || e.is_new_product_team) && demand.qualifies(e.remaining_hours, total, shift_avg)
        });

        let per_member = demand.hours_per_member(total, shift_avg);
        for index in candidates.into_iter().take(demand.effective_required as usize) {
            let consumed = pool.consume(index, per_member);
            if let Some(entry) = pool.entry(index) {
                result.assigned_members.push(AssignedMember {
                    name: entry.name.clone(),
                    coverage: CoverageKind::Volume,
                    allocated_hours: consumed,
                });
            }
        }

        finalize(&mut result, demand.effective_required);

        if result.shortage_headcount > 0 {
            let scope = if team_only { "新制品团队" } else { "检查员池" };
            self.sink.emit(
                DiagnosticKind::CapacityShortfall,
                Stage::Assignment,
                format!(
                    "品番 {} 纳期 {}: 缺少 {}/{} 名检查员 ({})",
                    task.part_code,
                    task.due_date
                        .map(|d| d.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    result.shortage_headcount,
                    demand.effective_required,
                    scope
                ),
            );
        }

        result
    }
}

// ==========================================
// 辅助函数 (技能分配引擎共用)
// ==========================================

/// 空分配结果
pub(crate) fn empty_result(prioritized: &PrioritizedTask) -> AssignmentResult {
    let task = &prioritized.task;
    AssignmentResult {
        part_code: task.part_code.clone(),
        process_number: task.current_process_number.clone(),
        process_number_list: task.process_number_list.clone(),
        due_date: task.due_date,
        total_inspection_hours: task.total_inspection_hours,
        required_headcount: prioritized.required_headcount,
        assigned_headcount: 0,
        shortage_headcount: 0,
        assigned_members: Vec::new(),
        is_new_product: task.is_new_product,
        skill_info_available: false,
    }
}

/// 填充人数与不足数
pub(crate) fn finalize(result: &mut AssignmentResult, effective_required: u32) {
    result.assigned_headcount = result.assigned_members.len() as u32;
    result.shortage_headcount = effective_required.saturating_sub(result.assigned_headcount);
}
