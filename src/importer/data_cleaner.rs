// ==========================================
// 检查排程系统 - 数据清洗器实现
// ==========================================
// 职责: TRIM / NULL 标准化 / 日期·数值·时刻解析
// 说明: 解析失败返回 None, 由调用方决定哨兵值并输出诊断
// ==========================================

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Excel 日期序列值的基准日 (1900 闰年 bug 已含在内)
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Excel 序列值的有效上限 (9999-12-31)
const EXCEL_MAX_SERIAL: f64 = 2_958_465.0;

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct DataCleaner;

impl DataCleaner {
    pub fn new() -> Self {
        Self
    }

    /// 空白 → None, 其余 TRIM
    pub fn normalize_null(&self, value: Option<&str>) -> Option<String> {
        value
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string())
    }

    /// 解析日期
    ///
    /// 支持: YYYY-MM-DD / YYYY/MM/DD / YYYYMMDD / 带时刻的形式 / Excel 序列值
    pub fn parse_date(&self, value: &str) -> Option<NaiveDate> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }

        for format in DATE_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
                return Some(date);
            }
        }
        for format in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Some(dt.date());
            }
        }

        // Excel 序列值 (YYYYMMDD 已在上面处理, 8 位整数不会落到这里)
        match trimmed.parse::<f64>() {
            Ok(serial) if serial.is_finite() && serial >= 1.0 && serial <= EXCEL_MAX_SERIAL => {
                excel_serial_to_date(serial)
            }
            _ => None,
        }
    }

    /// 解析数值 (允许千位分隔符); 非有限值 → None
    pub fn parse_number(&self, value: &str) -> Option<f64> {
        let cleaned: String = value.trim().chars().filter(|c| *c != ',').collect();
        if cleaned.is_empty() {
            return None;
        }
        cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    /// 解析勤务时刻
    ///
    /// 支持: HH:MM / HH:MM:SS / Excel 时刻分数 [0, 1)
    pub fn parse_shift_time(&self, value: &str) -> Option<NaiveTime> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }

        for format in ["%H:%M:%S", "%H:%M"] {
            if let Ok(time) = NaiveTime::parse_from_str(trimmed, format) {
                return Some(time);
            }
        }

        match trimmed.parse::<f64>() {
            Ok(fraction) if fraction.is_finite() && (0.0..1.0).contains(&fraction) => {
                let seconds = (fraction * 86_400.0).round() as u32;
                NaiveTime::from_num_seconds_from_midnight_opt(seconds.min(86_399), 0)
            }
            _ => None,
        }
    }

    /// 标志列 (★ / 1 / true / yes / ○)
    pub fn is_flagged(&self, value: Option<&str>) -> bool {
        match value.map(|v| v.trim().to_lowercase()) {
            Some(v) => matches!(v.as_str(), "★" | "☆" | "○" | "1" | "true" | "y" | "yes"),
            None => false,
        }
    }
}

/// Excel 序列值 → 日期 (小数部分忽略)
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    let (y, m, d) = EXCEL_EPOCH;
    let epoch = NaiveDate::from_ymd_opt(y, m, d)?;
    epoch.checked_add_signed(Duration::days(serial.floor() as i64))
}
