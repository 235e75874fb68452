// ==========================================
// 检查排程系统 - 核心库
// ==========================================
// 职责: 出荷不足品的检查开始期限计算与检查员分配
// 分层: domain (实体) → engine (业务规则) ← importer / report (外部文件)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 业务规则
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 报表层 - CSV 输出
pub mod report;

// 配置层 - 系统配置
pub mod config;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    AssignmentOrdering, CoverageKind, InspectionTimeSource, ProcessKey, SkillLevel, TimeUnit,
    UrgencyLevel,
};

// 领域实体
pub use domain::{
    AssignedMember, AssignmentResult, Inspector, ProcessMasterEntry, RawProcessMasterRow,
    ReconciledTask, ShortageRecord, SkillEntry, SkillTable,
};

// 引擎
pub use engine::{
    AssignmentEngine, DeadlineCalculator, DiagnosticsSink, InspectionScheduler, ProcessReconciler,
    ScheduleInputs, ScheduleRun, SkillAssignmentEngine, TaskPrioritizer, UnitNormalizer,
};

// 配置 / 导入 / 报表
pub use config::SchedulerConfig;
pub use importer::DatasetLoader;
pub use report::CsvExporter;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "检查排程系统";
