// ==========================================
// 检查排程系统 - 引擎层
// ==========================================
// 职责: 实现期限计算与检查员分配的业务规则
// 红线: Engine 不读写文件, 诊断一律经注入的 DiagnosticsSink 输出
// ==========================================

pub mod assignment;
pub mod deadline;
pub mod diagnostics;
pub mod error;
pub mod inspector_pool;
pub mod orchestrator;
pub mod priority;
pub mod process_reconciler;
pub mod skill_assignment;
pub mod summary;
pub mod unit_normalizer;

// 重导出核心引擎
pub use assignment::{AssignmentEngine, AssignmentOutcome, StaffingDemand};
pub use deadline::{is_business_day, DeadlineCalculator, DEFAULT_WORKDAY_HOURS};
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticsSink, MemorySink, Stage, TracingSink};
pub use error::{Dataset, EngineError, EngineResult};
pub use inspector_pool::{shift_average, InspectorPool, PoolEntry};
pub use orchestrator::{InspectionScheduler, ScheduleInputs, ScheduleRun};
pub use priority::{PrioritizedTask, TaskPrioritizer, DEFAULT_MAX_REQUIRED_HEADCOUNT};
pub use process_reconciler::{ProcessCatalog, ProcessReconciler, DEFAULT_INSPECTION_HOURS};
pub use skill_assignment::SkillAssignmentEngine;
pub use summary::{
    inspector_workloads, team_coverage_status, CapacityAnalysis, CoverageStatus, InspectorWorkload,
    NewProductCoverage, ScheduleSummary, SkillCoverageStats,
};
pub use unit_normalizer::{infer_unit, sample_stats, SampleStats, UnitDecision, UnitNormalizer};
