// ==========================================
// 检查排程系统 - 检查员 / 技能 领域模型
// ==========================================

use crate::domain::types::SkillLevel;
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 勤务时间缺省值 (小时)
pub const DEFAULT_SHIFT_HOURS: f64 = 8.0;

// ==========================================
// Inspector - 检查员
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inspector {
    pub name: String,
    pub shift_start: Option<NaiveTime>,
    pub shift_end: Option<NaiveTime>,
    pub is_new_product_team: bool, // 新制品团队 (★)
    pub group: Option<String>,     // 所属组
}

impl Inspector {
    pub fn new(name: &str, shift_start: Option<NaiveTime>, shift_end: Option<NaiveTime>) -> Self {
        Self {
            name: name.to_string(),
            shift_start,
            shift_end,
            is_new_product_team: false,
            group: None,
        }
    }

    /// 勤务时长 (小时)
    ///
    /// - 开始 == 结束 → 0
    /// - 结束早于开始 → 跨日
    /// - 任一缺失 → DEFAULT_SHIFT_HOURS
    pub fn shift_length_hours(&self) -> f64 {
        let (start, end) = match (self.shift_start, self.shift_end) {
            (Some(s), Some(e)) => (s, e),
            _ => return DEFAULT_SHIFT_HOURS,
        };

        let start_minutes = (start.hour() * 60 + start.minute()) as i64;
        let mut end_minutes = (end.hour() * 60 + end.minute()) as i64;
        if end_minutes < start_minutes {
            end_minutes += 24 * 60;
        }
        (end_minutes - start_minutes) as f64 / 60.0
    }
}

// ==========================================
// InspectorRuntimeState - 分配期内的检查员剩余时间
// ==========================================
// 每次分配开始时重置, 不跨运行持久化
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectorRuntimeState {
    pub name: String,
    pub remaining_hours: f64,
}

// ==========================================
// SkillEntry / SkillTable - 技能主数据
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillEntry {
    pub part_code: String,
    pub worker_name: String,
    pub skill_level: Option<SkillLevel>, // None = 不分配
}

/// 品番 → [(作业员, 技能等级)], 作业员顺序与原始列顺序一致
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkillTable {
    by_part: HashMap<String, Vec<(String, SkillLevel)>>,
    known_parts: Vec<String>,
}

impl SkillTable {
    pub fn from_entries(entries: &[SkillEntry]) -> Self {
        let mut table = SkillTable::default();
        for entry in entries {
            let part = entry.part_code.trim().to_string();
            if !table.by_part.contains_key(&part) {
                table.known_parts.push(part.clone());
                table.by_part.insert(part.clone(), Vec::new());
            }
            if let Some(level) = entry.skill_level {
                if let Some(workers) = table.by_part.get_mut(&part) {
                    if !workers.iter().any(|(name, _)| name == &entry.worker_name) {
                        workers.push((entry.worker_name.clone(), level));
                    }
                }
            }
        }
        table
    }

    /// 品番是否在技能表中出现
    pub fn contains_part(&self, part_code: &str) -> bool {
        self.by_part.contains_key(part_code)
    }

    /// 指定品番下有技能定义的作业员 (保持原始顺序)
    pub fn workers_for(&self, part_code: &str) -> &[(String, SkillLevel)] {
        self.by_part
            .get(part_code)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// 指定品番、指定等级的作业员
    pub fn workers_at_level(&self, part_code: &str, level: SkillLevel) -> Vec<&str> {
        self.workers_for(part_code)
            .iter()
            .filter(|(_, l)| *l == level)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn part_count(&self) -> usize {
        self.known_parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known_parts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(h, m, 0)
    }

    #[test]
    fn test_shift_length_day_shift() {
        let inspector = Inspector::new("A", t(8, 30), t(17, 15));
        assert!((inspector.shift_length_hours() - 8.75).abs() < 1e-9);
    }

    #[test]
    fn test_shift_length_overnight_and_equal() {
        let night = Inspector::new("B", t(22, 0), t(6, 0));
        assert_eq!(night.shift_length_hours(), 8.0);

        let zero = Inspector::new("C", t(9, 0), t(9, 0));
        assert_eq!(zero.shift_length_hours(), 0.0);

        let unknown = Inspector::new("D", None, t(9, 0));
        assert_eq!(unknown.shift_length_hours(), DEFAULT_SHIFT_HOURS);
    }

    #[test]
    fn test_skill_table_keeps_column_order() {
        let entries = vec![
            SkillEntry { part_code: "P1".into(), worker_name: "A".into(), skill_level: Some(SkillLevel::L2) },
            SkillEntry { part_code: "P1".into(), worker_name: "B".into(), skill_level: None },
            SkillEntry { part_code: "P1".into(), worker_name: "C".into(), skill_level: Some(SkillLevel::L1) },
            SkillEntry { part_code: "P2".into(), worker_name: "A".into(), skill_level: None },
        ];
        let table = SkillTable::from_entries(&entries);

        assert_eq!(table.part_count(), 2);
        assert!(table.contains_part("P2"));
        assert!(table.workers_for("P2").is_empty());
        assert_eq!(table.workers_for("P1").len(), 2);
        assert_eq!(table.workers_at_level("P1", SkillLevel::L1), vec!["C"]);
    }
}
