// ==========================================
// 检查排程系统 - 任务排序引擎
// ==========================================
// 职责: 一览排序 / 所需人数计算 / 分配顺序 / 紧急任务抽取
// 输入: 已计算期限与紧急度的 ReconciledTask 列表
// 输出: 排序后的任务列表 (稳定排序, 同键保持输入顺序)
// ==========================================

use crate::domain::task::{ReconciledTask, MISSING_DEADLINE_DAYS};
use crate::domain::types::AssignmentOrdering;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::instrument;

/// 所需人数上限缺省值
pub const DEFAULT_MAX_REQUIRED_HEADCOUNT: u32 = 50;

/// 勤务平均时长下限 (小时)
const MIN_SHIFT_HOURS: f64 = 0.1;

// ==========================================
// PrioritizedTask - 进入分配阶段的任务
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrioritizedTask {
    pub task: ReconciledTask,
    pub required_headcount: u32,
    pub days_until_due: i64, // 距纳期天数 (纳期缺失 → 999)
    pub priority_group: u8,  // 仅 SameDaySingleFirst 使用
}

// ==========================================
// TaskPrioritizer - 任务排序引擎
// ==========================================
pub struct TaskPrioritizer {
    max_required_headcount: u32,
}

impl Default for TaskPrioritizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUIRED_HEADCOUNT)
    }
}

impl TaskPrioritizer {
    pub fn new(max_required_headcount: u32) -> Self {
        Self {
            max_required_headcount: max_required_headcount.max(1),
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 一览排序
    ///
    /// 排序键:
    /// 1) 紧急度 升序
    /// 2) 距期限天数 升序
    /// 3) 总检查时间 降序
    pub fn sort_for_overview(&self, mut tasks: Vec<ReconciledTask>) -> Vec<ReconciledTask> {
        tasks.sort_by(|a, b| {
            a.urgency_level
                .cmp(&b.urgency_level)
                .then_with(|| a.days_until_deadline.cmp(&b.days_until_deadline))
                .then_with(|| compare_hours_desc(a.total_inspection_hours, b.total_inspection_hours))
        });
        tasks
    }

    /// 所需人数
    ///
    /// - 总时间 ≤ 0 → 1
    /// - 可用天数 = max(1, 纳期 - 今天), 纳期缺失 → 1
    /// - ceil(总时间 / (天数 × 勤务平均)), 限定在 [1, 上限]
    pub fn required_headcount(
        &self,
        total_hours: f64,
        due_date: Option<NaiveDate>,
        today: NaiveDate,
        shift_avg: f64,
    ) -> u32 {
        if !total_hours.is_finite() || total_hours <= 0.0 {
            return 1;
        }

        let days = due_date
            .map(|due| (due - today).num_days().max(1))
            .unwrap_or(1);
        let shift = if shift_avg.is_finite() {
            shift_avg.max(MIN_SHIFT_HOURS)
        } else {
            MIN_SHIFT_HOURS
        };
        let available = days as f64 * shift;

        let needed = (total_hours / available).ceil();
        if needed >= self.max_required_headcount as f64 {
            self.max_required_headcount
        } else {
            (needed as u32).max(1)
        }
    }

    /// 分配顺序
    ///
    /// - DueDateThenVolume: (距纳期 升序, 总时间 降序)
    /// - SameDaySingleFirst: 优先组 → (距纳期 升序, 总时间 降序)
    #[instrument(skip(self, tasks), fields(count = tasks.len(), ordering = %ordering))]
    pub fn sort_for_assignment(
        &self,
        tasks: Vec<ReconciledTask>,
        today: NaiveDate,
        shift_avg: f64,
        ordering: AssignmentOrdering,
    ) -> Vec<PrioritizedTask> {
        let mut prioritized: Vec<PrioritizedTask> = tasks
            .into_iter()
            .map(|task| {
                let required_headcount = self.required_headcount(
                    task.total_inspection_hours,
                    task.due_date,
                    today,
                    shift_avg,
                );
                let days_until_due = days_until_due(task.due_date, today);
                let priority_group = priority_group(task.due_date, today, required_headcount);
                PrioritizedTask {
                    task,
                    required_headcount,
                    days_until_due,
                    priority_group,
                }
            })
            .collect();

        prioritized.sort_by(|a, b| {
            let group = match ordering {
                AssignmentOrdering::DueDateThenVolume => Ordering::Equal,
                AssignmentOrdering::SameDaySingleFirst => a.priority_group.cmp(&b.priority_group),
            };
            group
                .then_with(|| a.days_until_due.cmp(&b.days_until_due))
                .then_with(|| {
                    compare_hours_desc(a.task.total_inspection_hours, b.task.total_inspection_hours)
                })
        });

        prioritized
    }

    /// 抽取距期限 ≤ max_days 的任务 (保持顺序)
    pub fn filter_urgent(&self, tasks: &[ReconciledTask], max_days: i64) -> Vec<ReconciledTask> {
        tasks
            .iter()
            .filter(|t| t.days_until_deadline <= max_days)
            .cloned()
            .collect()
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 距纳期天数; 纳期缺失 → 999
pub fn days_until_due(due_date: Option<NaiveDate>, today: NaiveDate) -> i64 {
    due_date
        .map(|due| (due - today).num_days())
        .unwrap_or(MISSING_DEADLINE_DAYS)
}

/// 优先组
///
/// 0 = 今日纳期且单人, 1 = 今日纳期且多人, 2 = 非今日且多人, 3 = 其他
pub fn priority_group(due_date: Option<NaiveDate>, today: NaiveDate, required_headcount: u32) -> u8 {
    let due_today = due_date == Some(today);
    let single = required_headcount <= 1;
    match (due_today, single) {
        (true, true) => 0,
        (true, false) => 1,
        (false, false) => 2,
        (false, true) => 3,
    }
}

/// 总时间降序比较 (NaN 视为最小)
fn compare_hours_desc(a: f64, b: f64) -> Ordering {
    let a = if a.is_nan() { f64::NEG_INFINITY } else { a };
    let b = if b.is_nan() { f64::NEG_INFINITY } else { b };
    b.total_cmp(&a)
}
