// ==========================================
// 检查排程系统 - 引擎层诊断输出
// ==========================================
// 职责: 定义诊断 sink trait, 各组件构造时注入
// 说明: 测试使用 MemorySink 捕获输出, 生产使用 TracingSink
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;

// ==========================================
// 诊断类型
// ==========================================

/// 诊断类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticKind {
    /// 必须数据缺失
    MissingData,
    /// 品番在主数据/技能表中不存在
    UnresolvedReference,
    /// 无法解析的值 (已替换为哨兵值)
    MalformedValue,
    /// 人员不足
    CapacityShortfall,
    /// 降级补全 (检查时间回退链)
    DegradedFill,
    /// 单位判定等一般信息
    Info,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagnosticKind::MissingData => "MISSING_DATA",
            DiagnosticKind::UnresolvedReference => "UNRESOLVED_REFERENCE",
            DiagnosticKind::MalformedValue => "MALFORMED_VALUE",
            DiagnosticKind::CapacityShortfall => "CAPACITY_SHORTFALL",
            DiagnosticKind::DegradedFill => "DEGRADED_FILL",
            DiagnosticKind::Info => "INFO",
        };
        write!(f, "{}", s)
    }
}

/// 产生诊断的流水线阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Import,
    UnitNormalizer,
    ProcessReconciler,
    DeadlineCalculator,
    TaskPrioritizer,
    Assignment,
    SkillAssignment,
    Orchestrator,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Import => "import",
            Stage::UnitNormalizer => "unit_normalizer",
            Stage::ProcessReconciler => "process_reconciler",
            Stage::DeadlineCalculator => "deadline_calculator",
            Stage::TaskPrioritizer => "task_prioritizer",
            Stage::Assignment => "assignment",
            Stage::SkillAssignment => "skill_assignment",
            Stage::Orchestrator => "orchestrator",
        };
        write!(f, "{}", s)
    }
}

/// 单条诊断
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub stage: Stage,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, stage: Stage, message: impl Into<String>) -> Self {
        Self {
            kind,
            stage,
            message: message.into(),
        }
    }
}

// ==========================================
// 诊断 Sink Trait
// ==========================================

/// 诊断输出接口
///
/// 组件在构造时接收 `Arc<dyn DiagnosticsSink>`, 不依赖进程级全局日志配置
pub trait DiagnosticsSink: Send + Sync {
    fn record(&self, diagnostic: Diagnostic);

    /// 便捷方法
    fn emit(&self, kind: DiagnosticKind, stage: Stage, message: String) {
        self.record(Diagnostic::new(kind, stage, message));
    }
}

/// 转发到 tracing 的 sink
#[derive(Debug, Clone, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn record(&self, diagnostic: Diagnostic) {
        match diagnostic.kind {
            DiagnosticKind::MissingData => tracing::error!(
                stage = %diagnostic.stage,
                kind = %diagnostic.kind,
                "{}",
                diagnostic.message
            ),
            DiagnosticKind::UnresolvedReference
            | DiagnosticKind::MalformedValue
            | DiagnosticKind::CapacityShortfall => tracing::warn!(
                stage = %diagnostic.stage,
                kind = %diagnostic.kind,
                "{}",
                diagnostic.message
            ),
            DiagnosticKind::DegradedFill | DiagnosticKind::Info => tracing::info!(
                stage = %diagnostic.stage,
                kind = %diagnostic.kind,
                "{}",
                diagnostic.message
            ),
        }
    }
}

/// 内存收集 sink (测试用)
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取得全部诊断的快照
    pub fn entries(&self) -> Vec<Diagnostic> {
        match self.entries.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count_of(&self, kind: DiagnosticKind) -> usize {
        self.entries().iter().filter(|d| d.kind == kind).count()
    }

    pub fn has(&self, kind: DiagnosticKind, stage: Stage) -> bool {
        self.entries()
            .iter()
            .any(|d| d.kind == kind && d.stage == stage)
    }
}

impl DiagnosticsSink for MemorySink {
    fn record(&self, diagnostic: Diagnostic) {
        match self.entries.lock() {
            Ok(mut guard) => guard.push(diagnostic),
            Err(poisoned) => poisoned.into_inner().push(diagnostic),
        }
    }
}
