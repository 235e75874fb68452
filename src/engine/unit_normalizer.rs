// ==========================================
// 检查排程系统 - 检查时间单位判定引擎
// ==========================================
// 职责: 推断制品主数据检查时间的单位并换算为小时
// 输入: 原始检查时间样本 + 可选的强制单位
// 输出: 以小时表示的 ProcessMasterEntry
// ==========================================
// 已知限制: 启发式判定, 平均 1 小时左右的数据可能误判
// ==========================================

use crate::domain::shortage::{ProcessMasterEntry, RawProcessMasterRow};
use crate::domain::types::TimeUnit;
use crate::engine::diagnostics::{DiagnosticKind, DiagnosticsSink, Stage};
use std::sync::Arc;
use tracing::instrument;

/// 单位判定结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitDecision {
    pub unit: TimeUnit,
    pub forced: bool,
}

/// 样本统计量
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleStats {
    pub max: f64,
    pub p95: f64,
    pub median: f64,
}

// ==========================================
// UnitNormalizer - 单位判定引擎
// ==========================================
pub struct UnitNormalizer {
    sink: Arc<dyn DiagnosticsSink>,
}

impl UnitNormalizer {
    pub fn new(sink: Arc<dyn DiagnosticsSink>) -> Self {
        Self { sink }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 判定单位
    ///
    /// 强制单位优先; 无法识别的强制单位 → 警告后走自动判定
    pub fn decide_unit(&self, sample: &[f64], forced_unit: Option<&str>) -> UnitDecision {
        if let Some(raw) = forced_unit {
            match raw.parse::<TimeUnit>() {
                Ok(unit) => return UnitDecision { unit, forced: true },
                Err(_) => {
                    self.sink.emit(
                        DiagnosticKind::MalformedValue,
                        Stage::UnitNormalizer,
                        format!("未知的强制时间单位 '{}', 改为自动判定", raw),
                    );
                }
            }
        }

        UnitDecision {
            unit: infer_unit(sample),
            forced: false,
        }
    }

    /// 换算主数据行为小时
    ///
    /// 检查时间非有限值的行被丢弃
    #[instrument(skip(self, rows), fields(count = rows.len()))]
    pub fn normalize(
        &self,
        rows: Vec<RawProcessMasterRow>,
        forced_unit: Option<&str>,
    ) -> (Vec<ProcessMasterEntry>, UnitDecision) {
        let mut dropped = 0usize;
        let valid: Vec<RawProcessMasterRow> = rows
            .into_iter()
            .filter(|row| {
                let ok = row.inspection_time_raw.is_finite();
                if !ok {
                    dropped += 1;
                }
                ok
            })
            .collect();

        if dropped > 0 {
            self.sink.emit(
                DiagnosticKind::MalformedValue,
                Stage::UnitNormalizer,
                format!("检查时间非数值, 已丢弃 {} 行主数据", dropped),
            );
        }

        let sample: Vec<f64> = valid.iter().map(|r| r.inspection_time_raw).collect();
        let decision = self.decide_unit(&sample, forced_unit);

        self.sink.emit(
            DiagnosticKind::Info,
            Stage::UnitNormalizer,
            format!(
                "检查时间单位={} 强制={} 行数={} (已换算为小时)",
                decision.unit,
                decision.forced,
                valid.len()
            ),
        );

        let entries = valid
            .into_iter()
            .map(|row| ProcessMasterEntry {
                part_code: row.part_code,
                process_number: row.process_number,
                inspection_time_hours: decision.unit.to_hours(row.inspection_time_raw),
            })
            .collect();

        (entries, decision)
    }
}

// ==========================================
// 纯函数
// ==========================================

/// 自动判定单位 (顺序执行, 命中即返回)
///
/// 1) max ≤ 1.5 → Excel 日分数
/// 2) p95 ≤ 100 且 median ≤ 60 → 分
/// 3) p95 ≤ 1.0 且 median ≤ 0.5 → 时
/// 4) 其他 → 秒
pub fn infer_unit(sample: &[f64]) -> TimeUnit {
    let stats = match sample_stats(sample) {
        Some(s) => s,
        None => return TimeUnit::Seconds,
    };

    if stats.max <= 1.5 {
        TimeUnit::Excel
    } else if stats.p95 <= 100.0 && stats.median <= 60.0 {
        TimeUnit::Minutes
    } else if stats.p95 <= 1.0 && stats.median <= 0.5 {
        TimeUnit::Hours
    } else {
        TimeUnit::Seconds
    }
}

/// 计算非负有限值样本的统计量; 样本为空返回 None
pub fn sample_stats(sample: &[f64]) -> Option<SampleStats> {
    let mut values: Vec<f64> = sample
        .iter()
        .copied()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .collect();
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));

    Some(SampleStats {
        max: values[values.len() - 1],
        p95: quantile_sorted(&values, 0.95),
        median: quantile_sorted(&values, 0.5),
    })
}

/// 线性插值分位数 (输入已排序且非空)
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let weight = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}
