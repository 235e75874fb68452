// ==========================================
// 检查排程系统 - 检查任务领域模型
// ==========================================
// 红线: current_process_number 仅用于显示, process_number_list 为标准工程目录
// ==========================================

use crate::domain::types::{InspectionTimeSource, UrgencyLevel};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// 期限缺失时的天数哨兵值
pub const MISSING_DEADLINE_DAYS: i64 = 999;

// ==========================================
// ReconciledTask - 对账后的检查任务
// ==========================================
// 每个 (品番, 纳期, 现在工程号) 一条
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledTask {
    // ===== 标识 =====
    pub part_code: String,
    pub due_date: Option<NaiveDate>,
    pub current_process_number: Option<String>, // 现在工程号 (出荷不足来源, 原样)
    pub process_number_list: Vec<String>,       // 标准工程号一览 (制品主数据)

    // ===== 检查时间 =====
    pub inspection_time_hours: f64,                 // 单件检查时间 (h)
    pub inspection_time_source: InspectionTimeSource,
    pub shortage_qty: f64,                          // 不足数 (带符号, 仅显示)
    pub produced_quantity: f64,                     // 实生产数量
    pub total_inspection_hours: f64,                // 总检查时间 (h)

    // ===== 期限/紧急度 =====
    pub inspection_start_deadline: Option<NaiveDateTime>,
    pub urgency_level: UrgencyLevel,
    pub days_until_deadline: i64,

    // ===== 标志 =====
    pub is_new_product: bool, // 品番不在制品主数据中
}

impl ReconciledTask {
    /// 现在工程号的显示文本
    pub fn current_process_display(&self) -> String {
        self.current_process_number
            .clone()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "UNREGISTERED".to_string())
    }

    /// 标准工程号一览的显示文本 (新制品等无主数据时为空, 不使用现在工程号)
    pub fn process_list_display(&self) -> String {
        self.process_number_list.join(",")
    }
}
