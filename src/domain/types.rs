// ==========================================
// 检查排程系统 - 领域类型定义
// ==========================================
// 红线: 紧急度是"等级制",不是评分制
// 红线: 现在工程号 与 标准工程号 是两个概念,禁止混用
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 紧急度等级 (Urgency Level)
// ==========================================
// 1 = 最紧急, 4 = 通常; 数值越小越紧急
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum UrgencyLevel {
    L1, // 最紧急（1日以内）
    L2, // 紧急（3日以内）
    L3, // 注意（1周以内）
    L4, // 通常
}

impl UrgencyLevel {
    /// 由距检查开始期限的天数判定等级
    ///
    /// 边界: d≤1 → L1, d≤3 → L2, d≤7 → L3, 其他 → L4
    pub fn from_days(days_until_deadline: i64) -> Self {
        if days_until_deadline <= 1 {
            UrgencyLevel::L1
        } else if days_until_deadline <= 3 {
            UrgencyLevel::L2
        } else if days_until_deadline <= 7 {
            UrgencyLevel::L3
        } else {
            UrgencyLevel::L4
        }
    }

    /// 数值等级 (1..=4)
    pub fn as_number(&self) -> u8 {
        match self {
            UrgencyLevel::L1 => 1,
            UrgencyLevel::L2 => 2,
            UrgencyLevel::L3 => 3,
            UrgencyLevel::L4 => 4,
        }
    }

    /// 等级说明
    pub fn description(&self) -> &'static str {
        match self {
            UrgencyLevel::L1 => "critical (within 1 day)",
            UrgencyLevel::L2 => "urgent (within 3 days)",
            UrgencyLevel::L3 => "caution (within 1 week)",
            UrgencyLevel::L4 => "normal",
        }
    }

    pub fn all() -> [UrgencyLevel; 4] {
        [UrgencyLevel::L1, UrgencyLevel::L2, UrgencyLevel::L3, UrgencyLevel::L4]
    }
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_number())
    }
}

// ==========================================
// 检查时间单位 (Time Unit)
// ==========================================
// 序列化格式与配置项 product_master_time_unit 一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Excel, // Excel 日分数 (1.0 = 24h)
}

impl TimeUnit {
    /// 换算为小时
    pub fn to_hours(&self, value: f64) -> f64 {
        match self {
            TimeUnit::Seconds => value / 3600.0,
            TimeUnit::Minutes => value / 60.0,
            TimeUnit::Hours => value,
            TimeUnit::Excel => value * 24.0,
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeUnit::Seconds => write!(f, "seconds"),
            TimeUnit::Minutes => write!(f, "minutes"),
            TimeUnit::Hours => write!(f, "hours"),
            TimeUnit::Excel => write!(f, "excel"),
        }
    }
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "seconds" => Ok(TimeUnit::Seconds),
            "minutes" => Ok(TimeUnit::Minutes),
            "hours" => Ok(TimeUnit::Hours),
            "excel" => Ok(TimeUnit::Excel),
            other => Err(format!("未知的时间单位: {}", other)),
        }
    }
}

// ==========================================
// 工程号标准化键 (Process Key)
// ==========================================
// 整数去掉小数点 ("3.0" → "3"), 空白/无法解析 → Undefined
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ProcessKey {
    Defined(String),
    Undefined,
}

impl ProcessKey {
    pub const UNDEFINED_LABEL: &'static str = "UNDEFINED";

    /// 标准化原始工程号
    pub fn normalize(raw: Option<&str>) -> Self {
        let trimmed = match raw.map(str::trim) {
            Some(v) if !v.is_empty() => v,
            _ => return ProcessKey::Undefined,
        };

        match trimmed.parse::<f64>() {
            Ok(num) if num.is_finite() => {
                if num == 0.0 {
                    // -0 与 0 视为同一工程
                    ProcessKey::Defined("0".to_string())
                } else if num.fract() == 0.0 {
                    ProcessKey::Defined(format!("{:.0}", num))
                } else {
                    ProcessKey::Defined(format!("{}", num))
                }
            }
            _ => ProcessKey::Undefined,
        }
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, ProcessKey::Defined(_))
    }

    /// 共通工程 (工程号 0)
    pub fn is_common_process(&self) -> bool {
        matches!(self, ProcessKey::Defined(v) if v == "0")
    }
}

impl fmt::Display for ProcessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessKey::Defined(v) => write!(f, "{}", v),
            ProcessKey::Undefined => write!(f, "{}", Self::UNDEFINED_LABEL),
        }
    }
}

// ==========================================
// 检查时间来源 (Inspection Time Source)
// ==========================================
// 回退链: MASTER → UNDEFINED_PROCESS_AVERAGE → COMMON_PROCESS → DEFAULT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InspectionTimeSource {
    Master,
    UndefinedProcessAverage,
    CommonProcess,
    Default,
}

impl InspectionTimeSource {
    /// 是否为降级补全
    pub fn is_degraded(&self) -> bool {
        !matches!(self, InspectionTimeSource::Master)
    }
}

impl fmt::Display for InspectionTimeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InspectionTimeSource::Master => write!(f, "MASTER"),
            InspectionTimeSource::UndefinedProcessAverage => write!(f, "UNDEFINED_PROCESS_AVERAGE"),
            InspectionTimeSource::CommonProcess => write!(f, "COMMON_PROCESS"),
            InspectionTimeSource::Default => write!(f, "DEFAULT"),
        }
    }
}

// ==========================================
// 技能等级 (Skill Level)
// ==========================================
// 顺序: L1(高) < L2(中) < L3(低), 分配时按此顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SkillLevel {
    L1,
    L2,
    L3,
}

impl SkillLevel {
    /// 从原始数值解析; 空/范围外 → None (不分配)
    pub fn from_value(value: f64) -> Option<Self> {
        if !value.is_finite() || value.fract() != 0.0 {
            return None;
        }
        match value as i64 {
            1 => Some(SkillLevel::L1),
            2 => Some(SkillLevel::L2),
            3 => Some(SkillLevel::L3),
            _ => None,
        }
    }

    pub fn as_number(&self) -> u8 {
        match self {
            SkillLevel::L1 => 1,
            SkillLevel::L2 => 2,
            SkillLevel::L3 => 3,
        }
    }

    pub fn all() -> [SkillLevel; 3] {
        [SkillLevel::L1, SkillLevel::L2, SkillLevel::L3]
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_number())
    }
}

// ==========================================
// 分配排序策略 (Assignment Ordering)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentOrdering {
    /// (距纳期天数 升序, 总检查时间 降序)
    #[default]
    DueDateThenVolume,
    /// 先按优先组 (今日纳期单人 → 今日纳期多人 → 非今日多人 → 其他), 再同上
    SameDaySingleFirst,
}

impl fmt::Display for AssignmentOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignmentOrdering::DueDateThenVolume => write!(f, "due_date_then_volume"),
            AssignmentOrdering::SameDaySingleFirst => write!(f, "same_day_single_first"),
        }
    }
}

impl FromStr for AssignmentOrdering {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "due_date_then_volume" => Ok(AssignmentOrdering::DueDateThenVolume),
            "same_day_single_first" => Ok(AssignmentOrdering::SameDaySingleFirst),
            other => Err(format!("未知的分配顺序: {}", other)),
        }
    }
}

// ==========================================
// 分配覆盖类型 (Coverage Kind)
// ==========================================
// 用于审计: 技能分配 vs 一般分配
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoverageKind {
    Volume,            // 数量驱动分配 (普通引擎)
    Skill(SkillLevel), // 技能分配
    General,           // 技能不足时的一般分配
}

impl fmt::Display for CoverageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoverageKind::Volume => write!(f, "VOLUME"),
            CoverageKind::Skill(level) => write!(f, "SKILL{}", level),
            CoverageKind::General => write!(f, "GENERAL"),
        }
    }
}
