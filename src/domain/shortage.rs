// ==========================================
// 检查排程系统 - 出荷不足 / 制品主数据 领域模型
// ==========================================
// 红线: current_process_number 为出荷不足来源的"现在工程号",
//       与制品主数据的"标准工程号"不是同一概念
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// ShortageRecord - 出荷不足记录
// ==========================================
// shortage_qty 可为负数(超量被标记为不足), 数量取绝对值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShortageRecord {
    pub due_date: Option<NaiveDate>,            // 纳期 (无法解析时为 None)
    pub part_code: String,                      // 品番
    pub shipment_qty: f64,                      // 出荷数
    pub shortage_qty: f64,                      // 不足数 (带符号)
    pub lot_id: Option<String>,                 // 生产批次ID (分组后为逗号拼接)
    pub lot_qty: Option<f64>,                   // 批次数量 (分组后为批次合计)
    pub current_process_number: Option<String>, // 现在工程号 (原样保留)
}

impl ShortageRecord {
    /// 不足数绝对值
    pub fn shortage_magnitude(&self) -> f64 {
        self.shortage_qty.abs()
    }
}

// ==========================================
// ProcessMasterEntry - 制品主数据 (工程/检查时间)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessMasterEntry {
    pub part_code: String,              // 品番
    pub process_number: Option<String>, // 标准工程号 (原始值, 未标准化)
    pub inspection_time_hours: f64,     // 检查时间 (已换算为小时)
}

/// 制品主数据原始行 (检查时间单位未定)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawProcessMasterRow {
    pub part_code: String,
    pub process_number: Option<String>,
    pub inspection_time_raw: f64,
}
