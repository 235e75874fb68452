// ==========================================
// 检查排程系统 - 引擎编排器
// ==========================================
// 用途: 协调各引擎的执行顺序
// 流程: 单位判定 → 工程对账 → 期限计算 → 排序 → 分配 (数量/技能) → 汇总
// ==========================================

use crate::config::SchedulerConfig;
use crate::domain::inspector::{Inspector, SkillEntry, SkillTable};
use crate::domain::shortage::{RawProcessMasterRow, ShortageRecord};
use crate::domain::task::ReconciledTask;
use crate::engine::assignment::{AssignmentEngine, AssignmentOutcome};
use crate::engine::deadline::DeadlineCalculator;
use crate::engine::diagnostics::{DiagnosticKind, DiagnosticsSink, Stage};
use crate::engine::error::{Dataset, EngineError, EngineResult};
use crate::engine::inspector_pool::shift_average;
use crate::engine::priority::TaskPrioritizer;
use crate::engine::process_reconciler::ProcessReconciler;
use crate::engine::skill_assignment::SkillAssignmentEngine;
use crate::engine::summary::{
    inspector_workloads, CapacityAnalysis, InspectorWorkload, NewProductCoverage, ScheduleSummary,
    SkillCoverageStats,
};
use crate::engine::unit_normalizer::{UnitDecision, UnitNormalizer};
use chrono::NaiveDateTime;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

// ==========================================
// ScheduleInputs - 运行输入
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ScheduleInputs {
    pub shortages: Vec<ShortageRecord>,
    pub master_rows: Vec<RawProcessMasterRow>,
    pub inspectors: Vec<Inspector>,
    pub skills: Vec<SkillEntry>,
}

// ==========================================
// ScheduleRun - 运行结果
// ==========================================
#[derive(Debug, Clone)]
pub struct ScheduleRun {
    pub run_id: String,
    pub now: NaiveDateTime,
    pub unit_decision: UnitDecision,

    // 期限/紧急度 (一览排序)
    pub tasks: Vec<ReconciledTask>,
    pub urgent_tasks: Vec<ReconciledTask>,

    // 分配
    pub assignment: AssignmentOutcome,
    pub skill_assignment: AssignmentOutcome,

    // 汇总
    pub schedule_summary: ScheduleSummary,
    pub capacity: CapacityAnalysis,
    pub workloads: Vec<InspectorWorkload>,
    pub skill_workloads: Vec<InspectorWorkload>,
    pub new_product_coverage: NewProductCoverage,
    pub skill_coverage: SkillCoverageStats,
}

// ==========================================
// InspectionScheduler - 引擎编排器
// ==========================================
pub struct InspectionScheduler {
    config: Arc<SchedulerConfig>,
    sink: Arc<dyn DiagnosticsSink>,
}

impl InspectionScheduler {
    pub fn new(config: Arc<SchedulerConfig>, sink: Arc<dyn DiagnosticsSink>) -> Self {
        Self { config, sink }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// 执行完整排程流程
    ///
    /// # 参数
    /// - inputs: 已读入的各数据集
    /// - now: 基准时刻 (紧急度以此计算)
    ///
    /// # 返回
    /// - Err(MissingData): 出荷不足或制品主数据为空
    /// - 检查员为空时分配结果为空表, 流程继续
    pub fn run(&self, inputs: ScheduleInputs, now: NaiveDateTime) -> EngineResult<ScheduleRun> {
        let run_id = Uuid::new_v4().to_string();
        info!(
            run_id = %run_id,
            now = %now,
            shortages = inputs.shortages.len(),
            master_rows = inputs.master_rows.len(),
            inspectors = inputs.inspectors.len(),
            skills = inputs.skills.len(),
            "开始执行检查排程"
        );

        let ScheduleInputs {
            shortages,
            master_rows,
            inspectors,
            skills,
        } = inputs;

        if shortages.is_empty() {
            return Err(self.missing(Dataset::Shortage));
        }
        if master_rows.is_empty() {
            return Err(self.missing(Dataset::ProcessMaster));
        }

        // ==========================================
        // 步骤1: 检查时间单位判定
        // ==========================================
        debug!("步骤1: 检查时间单位判定");
        let normalizer = UnitNormalizer::new(self.sink.clone());
        let (master, unit_decision) =
            normalizer.normalize(master_rows, self.config.product_master_time_unit.as_deref());
        if master.is_empty() {
            return Err(self.missing(Dataset::ProcessMaster));
        }

        // ==========================================
        // 步骤2: 工程对账
        // ==========================================
        debug!("步骤2: 工程对账");
        let reconciler = ProcessReconciler::new(self.sink.clone(), self.config.default_inspection_hours);
        let reconciled = reconciler.reconcile(shortages, &master);

        // ==========================================
        // 步骤3: 期限/紧急度
        // ==========================================
        debug!("步骤3: 期限/紧急度计算");
        let calculator = DeadlineCalculator::new(self.config.workday_hours, now);
        let scheduled = calculator.schedule_tasks(reconciled);

        // ==========================================
        // 步骤4: 排序
        // ==========================================
        debug!("步骤4: 任务排序");
        let prioritizer = TaskPrioritizer::new(self.config.max_required_headcount);
        let tasks = prioritizer.sort_for_overview(scheduled);
        let urgent_tasks = prioritizer.filter_urgent(&tasks, self.config.urgent_filter_days);

        let shift_avg = shift_average(&inspectors, self.config.default_shift_hours);
        let prioritized = prioritizer.sort_for_assignment(
            tasks.clone(),
            calculator.today(),
            shift_avg,
            self.config.assignment_ordering,
        );

        // ==========================================
        // 步骤5: 检查员分配
        // ==========================================
        debug!("步骤5: 检查员分配");
        let assignment_engine =
            AssignmentEngine::with_default_shift(self.sink.clone(), self.config.default_shift_hours);
        let assignment = self.or_empty(assignment_engine.assign(&prioritized, &inspectors), shift_avg);

        let skill_table = SkillTable::from_entries(&skills);
        let skill_engine =
            SkillAssignmentEngine::with_default_shift(self.sink.clone(), self.config.default_shift_hours);
        let skill_assignment = self.or_empty(
            skill_engine.assign(&prioritized, &inspectors, &skill_table),
            shift_avg,
        );

        // ==========================================
        // 步骤6: 汇总
        // ==========================================
        debug!("步骤6: 汇总");
        let schedule_summary = ScheduleSummary::from_tasks(&tasks);
        let capacity = CapacityAnalysis::from_inspectors(&inspectors);
        let workloads = inspector_workloads(&assignment.results);
        let skill_workloads = inspector_workloads(&skill_assignment.results);
        let new_product_coverage = NewProductCoverage::evaluate(&assignment.results, &inspectors);
        let skill_coverage = SkillCoverageStats::from_results(&skill_assignment.results);

        info!(
            run_id = %run_id,
            summary = %schedule_summary,
            urgent = urgent_tasks.len(),
            shortage = assignment.total_shortage(),
            skill_shortage = skill_assignment.total_shortage(),
            "检查排程完成"
        );

        Ok(ScheduleRun {
            run_id,
            now,
            unit_decision,
            tasks,
            urgent_tasks,
            assignment,
            skill_assignment,
            schedule_summary,
            capacity,
            workloads,
            skill_workloads,
            new_product_coverage,
            skill_coverage,
        })
    }

    fn missing(&self, dataset: Dataset) -> EngineError {
        self.sink.emit(
            DiagnosticKind::MissingData,
            Stage::Orchestrator,
            format!("必需数据集 {} 为空", dataset),
        );
        EngineError::MissingData { dataset }
    }

    /// 分配失败 (检查员缺失) → 空结果表, 流程继续
    fn or_empty(&self, outcome: EngineResult<AssignmentOutcome>, shift_avg: f64) -> AssignmentOutcome {
        match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                self.sink.emit(
                    DiagnosticKind::Info,
                    Stage::Orchestrator,
                    format!("分配结果为空: {}", e),
                );
                AssignmentOutcome {
                    results: Vec::new(),
                    final_states: Vec::new(),
                    shift_average: shift_avg,
                }
            }
        }
    }
}
