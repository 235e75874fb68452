// ==========================================
// 检查排程系统 - 检查员分配结果领域模型
// ==========================================

use crate::domain::types::CoverageKind;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// AssignedMember - 分配成员
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignedMember {
    pub name: String,
    pub coverage: CoverageKind,
    pub allocated_hours: f64, // 从该检查员预算中扣除的时间
}

impl AssignedMember {
    /// 显示文本, 例: "山田(SKILL1)" / "佐藤(GENERAL)"
    pub fn label(&self) -> String {
        match self.coverage {
            CoverageKind::Volume => self.name.clone(),
            other => format!("{}({})", self.name, other),
        }
    }
}

// ==========================================
// AssignmentResult - 单任务分配结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentResult {
    pub part_code: String,
    pub process_number: Option<String>, // 现在工程号 (出荷不足来源)
    pub process_number_list: Vec<String>, // 标准工程号一览
    pub due_date: Option<NaiveDate>,
    pub total_inspection_hours: f64,
    pub required_headcount: u32,
    pub assigned_headcount: u32,
    pub shortage_headcount: u32,
    pub assigned_members: Vec<AssignedMember>,
    pub is_new_product: bool,
    pub skill_info_available: bool, // 技能分配: 品番在技能表中存在
}

impl AssignmentResult {
    pub fn member_names(&self) -> Vec<&str> {
        self.assigned_members.iter().map(|m| m.name.as_str()).collect()
    }

    /// 成员显示文本 (逗号拼接)
    pub fn members_display(&self) -> String {
        self.assigned_members
            .iter()
            .map(|m| m.label())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn is_fully_assigned(&self) -> bool {
        self.shortage_headcount == 0
    }
}
