// ==========================================
// 检查排程系统 - 检查员时间池
// ==========================================
// 红线: 剩余时间任何时刻 ≥ 0
// 红线: 时间池每次分配运行重新建立, 不跨运行保留
// ==========================================
// 职责: 持有各检查员的剩余时间, 按剩余时间降序提供候选
// ==========================================

use crate::domain::inspector::{Inspector, InspectorRuntimeState, DEFAULT_SHIFT_HOURS};
use std::collections::HashSet;

/// 勤务平均时长
///
/// 至少一名检查员勤务时长 > 0 时取全员平均, 否则取缺省值
pub fn shift_average(inspectors: &[Inspector], default_shift_hours: f64) -> f64 {
    let lengths: Vec<f64> = inspectors
        .iter()
        .map(|i| i.shift_length_hours())
        .filter(|h| h.is_finite())
        .collect();

    if lengths.is_empty() || !lengths.iter().any(|h| *h > 0.0) {
        return if default_shift_hours > 0.0 {
            default_shift_hours
        } else {
            DEFAULT_SHIFT_HOURS
        };
    }
    lengths.iter().sum::<f64>() / lengths.len() as f64
}

/// 时间池条目
#[derive(Debug, Clone, PartialEq)]
pub struct PoolEntry {
    pub name: String,
    pub is_new_product_team: bool,
    pub remaining_hours: f64,
}

// ==========================================
// InspectorPool - 检查员时间池
// ==========================================
#[derive(Debug, Clone)]
pub struct InspectorPool {
    entries: Vec<PoolEntry>,
    budget_hours: f64,
}

impl InspectorPool {
    /// 建立时间池, 全员预算 = budget_hours
    ///
    /// 同名检查员仅保留首次出现
    pub fn new(inspectors: &[Inspector], budget_hours: f64) -> Self {
        let budget_hours = if budget_hours.is_finite() { budget_hours.max(0.0) } else { 0.0 };
        let mut seen: HashSet<&str> = HashSet::new();
        let entries = inspectors
            .iter()
            .filter(|i| seen.insert(i.name.as_str()))
            .map(|i| PoolEntry {
                name: i.name.clone(),
                is_new_product_team: i.is_new_product_team,
                remaining_hours: budget_hours,
            })
            .collect::<Vec<_>>();

        if entries.len() < inspectors.len() {
            tracing::debug!(
                duplicates = inspectors.len() - entries.len(),
                "同名检查员已合并"
            );
        }

        Self {
            entries,
            budget_hours,
        }
    }

    pub fn budget_hours(&self) -> f64 {
        self.budget_hours
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> Option<&PoolEntry> {
        self.entries.get(index)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    pub fn has_new_product_team(&self) -> bool {
        self.entries.iter().any(|e| e.is_new_product_team)
    }

    // ==========================================
    // 候选 / 消费
    // ==========================================

    /// 满足条件的候选索引, 按剩余时间降序 (同值按登记顺序)
    pub fn ranked_candidates<F>(&self, filter: F) -> Vec<usize>
    where
        F: Fn(&PoolEntry) -> bool,
    {
        let mut indices: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| filter(e))
            .map(|(i, _)| i)
            .collect();
        self.sort_by_remaining(&mut indices);
        indices
    }

    /// 就地按剩余时间降序排列索引 (稳定)
    pub fn sort_by_remaining(&self, indices: &mut [usize]) {
        indices.sort_by(|a, b| {
            self.entries[*b]
                .remaining_hours
                .total_cmp(&self.entries[*a].remaining_hours)
        });
    }

    /// 扣减时间 (下限 0), 返回实际扣减量
    pub fn consume(&mut self, index: usize, hours: f64) -> f64 {
        match self.entries.get_mut(index) {
            Some(entry) => {
                let before = entry.remaining_hours;
                entry.remaining_hours = (before - hours.max(0.0)).max(0.0);
                before - entry.remaining_hours
            }
            None => 0.0,
        }
    }

    pub fn remaining(&self, index: usize) -> f64 {
        self.entries
            .get(index)
            .map(|e| e.remaining_hours)
            .unwrap_or(0.0)
    }

    /// 当前全员状态快照
    pub fn states(&self) -> Vec<InspectorRuntimeState> {
        self.entries
            .iter()
            .map(|e| InspectorRuntimeState {
                name: e.name.clone(),
                remaining_hours: e.remaining_hours,
            })
            .collect()
    }
}
