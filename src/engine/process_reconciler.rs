// ==========================================
// 检查排程系统 - 工程对账引擎
// ==========================================
// 红线: 现在工程号(出荷不足) 与 标准工程号(制品主数据) 必须分字段保存,禁止合并
// ==========================================
// 职责: 为每条出荷不足记录附加标准工程号一览与检查时间
// 输入: ShortageRecord 列表 + ProcessMasterEntry 列表 (小时)
// 输出: ReconciledTask 列表 (期限/紧急度尚未计算)
// ==========================================

use crate::domain::shortage::{ProcessMasterEntry, ShortageRecord};
use crate::domain::task::{ReconciledTask, MISSING_DEADLINE_DAYS};
use crate::domain::types::{InspectionTimeSource, ProcessKey, UrgencyLevel};
use crate::engine::diagnostics::{DiagnosticKind, DiagnosticsSink, Stage};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::instrument;

/// 检查时间完全不明时的缺省值 (小时)
pub const DEFAULT_INSPECTION_HOURS: f64 = 2.0;

// ==========================================
// ProcessCatalog - 制品主数据索引
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ProcessCatalog {
    /// (品番, 标准化工程号) → 平均检查时间
    averages: BTreeMap<(String, ProcessKey), f64>,
    /// 品番 → 工程号未设定行的平均检查时间 (回退 a)
    blank_process_average: HashMap<String, f64>,
    /// 品番 → 工程号 0 的检查时间 (回退 b, 取首行)
    common_process_time: HashMap<String, f64>,
    /// 制品主数据中出现过的品番
    parts: HashSet<String>,
}

impl ProcessCatalog {
    /// 构建索引
    ///
    /// - 重复 (品番, 工程号) 取平均
    /// - 有已定义工程号的品番, 丢弃其未定义行
    /// - 仅有未定义行的品番, 保留一条合成的 UNDEFINED 记录
    pub fn build(master: &[ProcessMasterEntry]) -> Self {
        let mut catalog = ProcessCatalog::default();

        let mut parts_with_defined: HashSet<String> = HashSet::new();
        for entry in master {
            let part = entry.part_code.trim().to_string();
            catalog.parts.insert(part.clone());
            if ProcessKey::normalize(entry.process_number.as_deref()).is_defined() {
                parts_with_defined.insert(part);
            }
        }

        let mut sums: BTreeMap<(String, ProcessKey), (f64, usize)> = BTreeMap::new();
        let mut blank_sums: HashMap<String, (f64, usize)> = HashMap::new();

        for entry in master {
            let hours = entry.inspection_time_hours;
            if !hours.is_finite() {
                continue;
            }
            let part = entry.part_code.trim().to_string();
            let key = ProcessKey::normalize(entry.process_number.as_deref());

            let is_blank = entry
                .process_number
                .as_deref()
                .map(|v| v.trim().is_empty())
                .unwrap_or(true);
            if is_blank {
                let slot = blank_sums.entry(part.clone()).or_insert((0.0, 0));
                slot.0 += hours;
                slot.1 += 1;
            }

            if key.is_common_process() && !catalog.common_process_time.contains_key(&part) {
                catalog.common_process_time.insert(part.clone(), hours);
            }

            if !key.is_defined() && parts_with_defined.contains(&part) {
                continue;
            }

            let slot = sums.entry((part, key)).or_insert((0.0, 0));
            slot.0 += hours;
            slot.1 += 1;
        }

        catalog.averages = sums
            .into_iter()
            .map(|(k, (sum, n))| (k, sum / n as f64))
            .collect();
        catalog.blank_process_average = blank_sums
            .into_iter()
            .map(|(k, (sum, n))| (k, sum / n as f64))
            .collect();

        catalog
    }

    pub fn contains_part(&self, part_code: &str) -> bool {
        self.parts.contains(part_code)
    }

    pub fn part_count(&self) -> usize {
        self.parts.len()
    }

    /// 已定义工程号的平均检查时间
    pub fn average_for(&self, part_code: &str, key: &ProcessKey) -> Option<f64> {
        if !key.is_defined() {
            return None;
        }
        self.averages
            .get(&(part_code.to_string(), key.clone()))
            .copied()
    }

    /// 品番的标准工程号一览 (字典序)
    pub fn process_list(&self, part_code: &str) -> Vec<String> {
        self.averages
            .keys()
            .filter(|(part, _)| part == part_code)
            .map(|(_, key)| key.to_string())
            .collect()
    }

    pub fn blank_process_average(&self, part_code: &str) -> Option<f64> {
        self.blank_process_average.get(part_code).copied()
    }

    pub fn common_process_time(&self, part_code: &str) -> Option<f64> {
        self.common_process_time.get(part_code).copied()
    }
}

// ==========================================
// ProcessReconciler - 工程对账引擎
// ==========================================
pub struct ProcessReconciler {
    sink: Arc<dyn DiagnosticsSink>,
    default_inspection_hours: f64,
}

impl ProcessReconciler {
    pub fn new(sink: Arc<dyn DiagnosticsSink>, default_inspection_hours: f64) -> Self {
        Self {
            sink,
            default_inspection_hours,
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 对账
    ///
    /// 步骤:
    /// 1) 每个 (品番, 纳期, 现在工程号) 仅保留 |不足数| 最大的一行
    /// 2) 以 (品番, 标准化现在工程号) 关联制品主数据
    /// 3) 未关联: 工程号空白行平均 → 工程号 0 → 缺省值
    #[instrument(skip(self, shortages, master), fields(
        shortage_count = shortages.len(),
        master_count = master.len()
    ))]
    pub fn reconcile(
        &self,
        shortages: Vec<ShortageRecord>,
        master: &[ProcessMasterEntry],
    ) -> Vec<ReconciledTask> {
        let catalog = ProcessCatalog::build(master);
        let deduped = self.deduplicate(shortages);

        let negative_count = deduped.iter().filter(|r| r.shortage_qty < 0.0).count();
        if negative_count > 0 {
            self.sink.emit(
                DiagnosticKind::Info,
                Stage::ProcessReconciler,
                format!(
                    "{} 行不足数为负数, 使用绝对值",
                    negative_count
                ),
            );
        }

        let mut fill_counts: HashMap<InspectionTimeSource, usize> = HashMap::new();
        let tasks: Vec<ReconciledTask> = deduped
            .into_iter()
            .map(|record| {
                let task = self.reconcile_single(record, &catalog);
                *fill_counts.entry(task.inspection_time_source).or_insert(0) += 1;
                task
            })
            .collect();

        tracing::info!(
            tasks = tasks.len(),
            master_parts = catalog.part_count(),
            fills = ?fill_counts,
            "工程对账完成"
        );

        tasks
    }

    /// 单条对账
    pub fn reconcile_single(&self, record: ShortageRecord, catalog: &ProcessCatalog) -> ReconciledTask {
        let part_code = record.part_code.trim().to_string();
        let current_key = ProcessKey::normalize(record.current_process_number.as_deref());
        let is_new_product = !catalog.contains_part(&part_code);

        if is_new_product {
            self.sink.emit(
                DiagnosticKind::UnresolvedReference,
                Stage::ProcessReconciler,
                format!("品番 {} 不在制品主数据中 (新制品)", part_code),
            );
        }

        let (inspection_time_hours, inspection_time_source) =
            self.resolve_inspection_time(&part_code, &current_key, catalog);

        let produced_quantity = match record.lot_qty {
            Some(q) if q.is_finite() => q,
            _ => record.shortage_qty.abs(),
        };

        ReconciledTask {
            process_number_list: catalog.process_list(&part_code),
            part_code,
            due_date: record.due_date,
            current_process_number: record.current_process_number,
            inspection_time_hours,
            inspection_time_source,
            shortage_qty: record.shortage_qty,
            produced_quantity,
            total_inspection_hours: produced_quantity * inspection_time_hours,
            inspection_start_deadline: None,
            urgency_level: UrgencyLevel::L4,
            days_until_deadline: MISSING_DEADLINE_DAYS,
            is_new_product,
        }
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    /// 检查时间解析 (含回退链)
    fn resolve_inspection_time(
        &self,
        part_code: &str,
        current_key: &ProcessKey,
        catalog: &ProcessCatalog,
    ) -> (f64, InspectionTimeSource) {
        if let Some(hours) = catalog.average_for(part_code, current_key) {
            return (hours, InspectionTimeSource::Master);
        }

        if let Some(hours) = catalog.blank_process_average(part_code) {
            self.sink.emit(
                DiagnosticKind::DegradedFill,
                Stage::ProcessReconciler,
                format!(
                    "品番 {} 工程 {}: 检查时间取自工程号空白的主数据行 ({:.6}h)",
                    part_code, current_key, hours
                ),
            );
            return (hours, InspectionTimeSource::UndefinedProcessAverage);
        }

        if let Some(hours) = catalog.common_process_time(part_code) {
            self.sink.emit(
                DiagnosticKind::DegradedFill,
                Stage::ProcessReconciler,
                format!(
                    "品番 {} 工程 {}: 检查时间取自共通工程 0 ({:.6}h)",
                    part_code, current_key, hours
                ),
            );
            return (hours, InspectionTimeSource::CommonProcess);
        }

        self.sink.emit(
            DiagnosticKind::DegradedFill,
            Stage::ProcessReconciler,
            format!(
                "品番 {} 工程 {}: 检查时间未知, 使用默认值 {}h",
                part_code, current_key, self.default_inspection_hours
            ),
        );
        (self.default_inspection_hours, InspectionTimeSource::Default)
    }

    /// 去重: 每个 (品番, 纳期, 现在工程号) 保留 |不足数| 最大的一行
    ///
    /// 输出按 |不足数| 降序 (同值保持输入顺序)
    fn deduplicate(&self, mut shortages: Vec<ShortageRecord>) -> Vec<ShortageRecord> {
        shortages.sort_by(|a, b| b.shortage_qty.abs().total_cmp(&a.shortage_qty.abs()));

        let mut seen: HashSet<(String, Option<NaiveDate>, Option<String>)> = HashSet::new();
        let before = shortages.len();
        let kept: Vec<ShortageRecord> = shortages
            .into_iter()
            .filter(|r| {
                seen.insert((
                    r.part_code.trim().to_string(),
                    r.due_date,
                    r.current_process_number.as_ref().map(|p| p.trim().to_string()),
                ))
            })
            .collect();

        if kept.len() < before {
            tracing::debug!(removed = before - kept.len(), "重复的出荷不足行已去除");
        }
        kept
    }
}
