// ==========================================
// 检查排程系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含文件读写逻辑,不含引擎逻辑
// ==========================================

pub mod assignment;
pub mod inspector;
pub mod shortage;
pub mod task;
pub mod types;

// 重导出核心类型
pub use assignment::{AssignedMember, AssignmentResult};
pub use inspector::{Inspector, InspectorRuntimeState, SkillEntry, SkillTable, DEFAULT_SHIFT_HOURS};
pub use shortage::{ProcessMasterEntry, RawProcessMasterRow, ShortageRecord};
pub use task::{ReconciledTask, MISSING_DEADLINE_DAYS};
pub use types::{
    AssignmentOrdering, CoverageKind, InspectionTimeSource, ProcessKey, SkillLevel, TimeUnit,
    UrgencyLevel,
};
