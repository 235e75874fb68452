// ==========================================
// 检查排程系统 - 检查开始期限计算引擎
// ==========================================
// 红线: 周末不计入所需工作日, 逆推时一律跳过
// 红线: 紧急度是"等级制",不是评分制
// ==========================================
// 职责: 纳期 + 总检查时间 → 检查开始期限; 期限 + 基准时刻 → 紧急度
// ==========================================

use crate::domain::task::{ReconciledTask, MISSING_DEADLINE_DAYS};
use crate::domain::types::UrgencyLevel;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use tracing::instrument;

/// 标准工作日时长 (小时)
pub const DEFAULT_WORKDAY_HOURS: f64 = 8.0;

const SECONDS_PER_DAY: i64 = 86_400;

// ==========================================
// DeadlineCalculator - 期限计算引擎
// ==========================================
#[derive(Debug, Clone)]
pub struct DeadlineCalculator {
    workday_hours: f64,
    now: NaiveDateTime,
}

impl DeadlineCalculator {
    /// 构造函数
    ///
    /// # 参数
    /// - `workday_hours`: 一个工作日的稼动时长 (≤0 时使用 8h)
    /// - `now`: 基准时刻 (由调用方提供, 不读取系统时钟)
    pub fn new(workday_hours: f64, now: NaiveDateTime) -> Self {
        let workday_hours = if workday_hours.is_finite() && workday_hours > 0.0 {
            workday_hours
        } else {
            DEFAULT_WORKDAY_HOURS
        };
        Self { workday_hours, now }
    }

    pub fn now(&self) -> NaiveDateTime {
        self.now
    }

    pub fn today(&self) -> NaiveDate {
        self.now.date()
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 计算检查开始期限
    ///
    /// 所需工作日 = total_hours / workday_hours; 从纳期 0 时起逐日回退,
    /// 仅周一至周五扣减, 直至剩余 ≤ 0
    pub fn inspection_deadline(&self, due_date: NaiveDate, total_hours: f64) -> NaiveDateTime {
        let due = due_date.and_time(chrono::NaiveTime::MIN);

        let required_days = total_hours / self.workday_hours;
        if !required_days.is_finite() || required_days <= 0.0 {
            return due;
        }

        // 剩余天数 r>0 时, 需回退恰好 ceil(r) 个工作日
        let mut weekdays_left = required_days.ceil() as i64;
        let mut cursor = due_date;

        // 整周跳跃: 回退 7 天恰好经过 5 个工作日
        while weekdays_left > 5 {
            cursor = match cursor.checked_sub_signed(Duration::days(7)) {
                Some(d) => d,
                None => return NaiveDateTime::MIN,
            };
            weekdays_left -= 5;
        }

        while weekdays_left > 0 {
            cursor = match cursor.pred_opt() {
                Some(d) => d,
                None => return NaiveDateTime::MIN,
            };
            if is_business_day(cursor) {
                weekdays_left -= 1;
            }
        }

        cursor.and_time(chrono::NaiveTime::MIN)
    }

    /// 距期限的天数 (向下取整); 期限缺失 → 999
    pub fn days_until(&self, deadline: Option<NaiveDateTime>) -> i64 {
        match deadline {
            Some(d) => (d - self.now).num_seconds().div_euclid(SECONDS_PER_DAY),
            None => MISSING_DEADLINE_DAYS,
        }
    }

    /// 判定紧急度
    ///
    /// 返回: (紧急度, 距期限天数)
    pub fn urgency(&self, deadline: Option<NaiveDateTime>) -> (UrgencyLevel, i64) {
        match deadline {
            Some(_) => {
                let days = self.days_until(deadline);
                (UrgencyLevel::from_days(days), days)
            }
            None => (UrgencyLevel::L4, MISSING_DEADLINE_DAYS),
        }
    }

    /// 为对账任务填充期限/紧急度 (返回新序列)
    ///
    /// 纳期缺失 → 期限 None, 紧急度 4, 天数 999
    #[instrument(skip(self, tasks), fields(count = tasks.len(), now = %self.now))]
    pub fn schedule_tasks(&self, tasks: Vec<ReconciledTask>) -> Vec<ReconciledTask> {
        tasks
            .into_iter()
            .map(|task| {
                let deadline = task
                    .due_date
                    .map(|due| self.inspection_deadline(due, task.total_inspection_hours));
                let (urgency_level, days_until_deadline) = self.urgency(deadline);
                ReconciledTask {
                    inspection_start_deadline: deadline,
                    urgency_level,
                    days_until_deadline,
                    ..task
                }
            })
            .collect()
    }

    /// [start, end) 区间的工作日数
    pub fn workday_count(&self, start: NaiveDate, end: NaiveDate) -> i64 {
        if start >= end {
            return 0;
        }
        start
            .iter_days()
            .take_while(|d| *d < end)
            .filter(|d| is_business_day(*d))
            .count() as i64
    }
}

/// 周一至周五
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

// ==========================================
// 单元测试
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, 0, 0).unwrap()
    }

    /// 基准: 2026-01-12 (周一) 09:00
    fn calculator() -> DeadlineCalculator {
        DeadlineCalculator::new(DEFAULT_WORKDAY_HOURS, at(2026, 1, 12, 9))
    }

    #[test]
    fn test_friday_eight_hours_is_thursday() {
        let calc = calculator();
        // 2026-01-16 周五
        let deadline = calc.inspection_deadline(date(2026, 1, 16), 8.0);
        assert_eq!(deadline, at(2026, 1, 15, 0));
    }

    #[test]
    fn test_monday_eight_hours_is_prior_friday() {
        let calc = calculator();
        // 2026-01-19 周一
        let deadline = calc.inspection_deadline(date(2026, 1, 19), 8.0);
        assert_eq!(deadline, at(2026, 1, 16, 0));
    }

    #[test]
    fn test_partial_day_counts_as_one_business_day() {
        let calc = calculator();
        let deadline = calc.inspection_deadline(date(2026, 1, 19), 3.0);
        assert_eq!(deadline, at(2026, 1, 16, 0));
    }

    #[test]
    fn test_zero_hours_keeps_due_date() {
        let calc = calculator();
        assert_eq!(calc.inspection_deadline(date(2026, 1, 19), 0.0), at(2026, 1, 19, 0));
        assert_eq!(calc.inspection_deadline(date(2026, 1, 19), -4.0), at(2026, 1, 19, 0));
        assert_eq!(calc.inspection_deadline(date(2026, 1, 19), f64::NAN), at(2026, 1, 19, 0));
    }

    #[test]
    fn test_multi_week_jump_matches_stepwise_walk() {
        let calc = calculator();
        // 12 个工作日: 从 2026-01-30 (周五) 回退
        let deadline = calc.inspection_deadline(date(2026, 1, 30), 96.0);
        // 逐日: 1/29..1/26 (4), 1/23..1/19 (5) → 9, 1/16,1/15,1/14 → 12
        assert_eq!(deadline, at(2026, 1, 14, 0));
    }

    #[test]
    fn test_weekend_due_date() {
        let calc = calculator();
        // 2026-01-18 周日, 8h → 周五
        assert_eq!(calc.inspection_deadline(date(2026, 1, 18), 8.0), at(2026, 1, 16, 0));
    }

    #[test]
    fn test_days_until_floors() {
        let calc = calculator();
        // 期限在 15 小时后 → 0 天
        assert_eq!(calc.days_until(Some(at(2026, 1, 13, 0))), 0);
        // 期限在 9 小时前 → -1 天
        assert_eq!(calc.days_until(Some(at(2026, 1, 12, 0))), -1);
        assert_eq!(calc.days_until(Some(at(2026, 1, 20, 9))), 8);
        assert_eq!(calc.days_until(None), MISSING_DEADLINE_DAYS);
    }

    #[test]
    fn test_urgency_levels() {
        let calc = calculator();
        assert_eq!(calc.urgency(Some(at(2026, 1, 13, 9))).0, UrgencyLevel::L1);
        assert_eq!(calc.urgency(Some(at(2026, 1, 15, 9))).0, UrgencyLevel::L2);
        assert_eq!(calc.urgency(Some(at(2026, 1, 19, 9))).0, UrgencyLevel::L3);
        assert_eq!(calc.urgency(Some(at(2026, 1, 20, 9))).0, UrgencyLevel::L4);
        assert_eq!(calc.urgency(None), (UrgencyLevel::L4, 999));
    }

    #[test]
    fn test_schedule_tasks_fills_derived_fields() {
        use crate::domain::types::InspectionTimeSource;

        let calc = calculator();
        let base = ReconciledTask {
            part_code: "P1".to_string(),
            due_date: Some(date(2026, 1, 16)),
            current_process_number: Some("2".to_string()),
            process_number_list: vec!["2".to_string()],
            inspection_time_hours: 0.5,
            inspection_time_source: InspectionTimeSource::Master,
            shortage_qty: -16.0,
            produced_quantity: 16.0,
            total_inspection_hours: 8.0,
            inspection_start_deadline: None,
            urgency_level: UrgencyLevel::L4,
            days_until_deadline: MISSING_DEADLINE_DAYS,
            is_new_product: false,
        };
        let undated = ReconciledTask {
            due_date: None,
            ..base.clone()
        };

        let scheduled = calc.schedule_tasks(vec![base, undated]);
        assert_eq!(scheduled[0].inspection_start_deadline, Some(at(2026, 1, 15, 0)));
        // 1/15 00:00 - 1/12 09:00 = 2.625 天 → 2
        assert_eq!(scheduled[0].days_until_deadline, 2);
        assert_eq!(scheduled[0].urgency_level, UrgencyLevel::L2);
        assert_eq!(scheduled[1].inspection_start_deadline, None);
        assert_eq!(scheduled[1].urgency_level, UrgencyLevel::L4);
        assert_eq!(scheduled[1].days_until_deadline, MISSING_DEADLINE_DAYS);
    }

    #[test]
    fn test_workday_count() {
        let calc = calculator();
        assert_eq!(calc.workday_count(date(2026, 1, 12), date(2026, 1, 19)), 5);
        assert_eq!(calc.workday_count(date(2026, 1, 17), date(2026, 1, 19)), 0);
        assert_eq!(calc.workday_count(date(2026, 1, 19), date(2026, 1, 12)), 0);
    }
}
