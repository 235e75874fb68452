// ==========================================
// 检查排程系统 - CSV 报表输出
// ==========================================
// 输出: 检查排程一览 / 检查员分配 (数量·技能) / 负荷 / 成员明细
// 小时列按 csv_decimals 四舍五入
// ==========================================

use crate::domain::assignment::AssignmentResult;
use crate::domain::inspector::Inspector;
use crate::domain::task::ReconciledTask;
use crate::engine::orchestrator::ScheduleRun;
use crate::engine::summary::{team_coverage_status, InspectorWorkload};
use crate::report::error::{ReportError, ReportResult};
use chrono::{NaiveDate, NaiveDateTime};
use csv::Writer;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 报表种类 (决定文件名)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Schedule,
    UrgentTasks,
    Assignment,
    SkillAssignment,
    Workload,
    SkillWorkload,
    MemberDetail,
    SkillMemberDetail,
}

impl ReportKind {
    pub fn file_stem(&self) -> &'static str {
        match self {
            ReportKind::Schedule => "inspection_schedule",
            ReportKind::UrgentTasks => "urgent_tasks",
            ReportKind::Assignment => "inspector_assignment",
            ReportKind::SkillAssignment => "skill_assignment",
            ReportKind::Workload => "inspector_workload",
            ReportKind::SkillWorkload => "skill_workload",
            ReportKind::MemberDetail => "assignment_members",
            ReportKind::SkillMemberDetail => "skill_assignment_members",
        }
    }
}

// ==========================================
// CsvExporter
// ==========================================
pub struct CsvExporter {
    output_dir: PathBuf,
    decimals: usize,
    timestamp: Option<String>,
}

impl CsvExporter {
    /// # 参数
    /// - stamp_time: Some 时文件名附加 `_YYYYMMDD_HHMMSS`
    pub fn new<P: AsRef<Path>>(output_dir: P, decimals: usize, stamp_time: Option<NaiveDateTime>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            decimals,
            timestamp: stamp_time.map(|t| t.format("%Y%m%d_%H%M%S").to_string()),
        }
    }

    pub fn path_for(&self, kind: ReportKind) -> PathBuf {
        let name = match &self.timestamp {
            Some(ts) => format!("{}_{}.csv", kind.file_stem(), ts),
            None => format!("{}.csv", kind.file_stem()),
        };
        self.output_dir.join(name)
    }

    /// 一次运行的全部报表
    #[instrument(skip(self, run, inspectors), fields(run_id = %run.run_id))]
    pub fn export_run(&self, run: &ScheduleRun, inspectors: &[Inspector]) -> ReportResult<Vec<PathBuf>> {
        let paths = vec![
            self.export_schedule(ReportKind::Schedule, &run.tasks)?,
            self.export_schedule(ReportKind::UrgentTasks, &run.urgent_tasks)?,
            self.export_assignment(ReportKind::Assignment, &run.assignment.results, inspectors)?,
            self.export_assignment(ReportKind::SkillAssignment, &run.skill_assignment.results, inspectors)?,
            self.export_workload(ReportKind::Workload, &run.workloads)?,
            self.export_workload(ReportKind::SkillWorkload, &run.skill_workloads)?,
            self.export_member_detail(ReportKind::MemberDetail, &run.assignment.results)?,
            self.export_member_detail(ReportKind::SkillMemberDetail, &run.skill_assignment.results)?,
        ];
        info!(files = paths.len(), output_dir = %self.output_dir.display(), "报表输出完成");
        Ok(paths)
    }

    // ==========================================
    // 检查排程一览
    // ==========================================
    pub fn export_schedule(&self, kind: ReportKind, tasks: &[ReconciledTask]) -> ReportResult<PathBuf> {
        let path = self.path_for(kind);
        let mut writer = self.open(&path)?;
        writer.write_record([
            "品番",
            "納期",
            "現在工程番号",
            "工程番号一覧",
            "不足数",
            "実生産数",
            "検査時間(h)",
            "検査時間区分",
            "総検査時間(h)",
            "検査開始期限",
            "残日数",
            "緊急度",
            "緊急度説明",
            "新製品",
        ])?;

        for task in tasks {
            writer.write_record([
                task.part_code.clone(),
                date_cell(task.due_date),
                task.current_process_display(),
                task.process_list_display(),
                self.num(task.shortage_qty),
                self.num(task.produced_quantity),
                self.num(task.inspection_time_hours),
                task.inspection_time_source.to_string(),
                self.num(task.total_inspection_hours),
                task.inspection_start_deadline
                    .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default(),
                task.days_until_deadline.to_string(),
                task.urgency_level.as_number().to_string(),
                task.urgency_level.description().to_string(),
                flag_cell(task.is_new_product),
            ])?;
        }

        writer.flush()?;
        Ok(path)
    }

    // ==========================================
    // 检查员分配
    // ==========================================
    pub fn export_assignment(
        &self,
        kind: ReportKind,
        results: &[AssignmentResult],
        inspectors: &[Inspector],
    ) -> ReportResult<PathBuf> {
        let team: HashSet<&str> = inspectors
            .iter()
            .filter(|i| i.is_new_product_team)
            .map(|i| i.name.as_str())
            .collect();

        let path = self.path_for(kind);
        let mut writer = self.open(&path)?;
        writer.write_record([
            "品番",
            "現在工程番号",
            "工程番号一覧",
            "納期",
            "総検査時間(h)",
            "必要人数",
            "割当人数",
            "不足人数",
            "割当メンバー",
            "新製品",
            "新製品チーム",
            "技能情報",
        ])?;

        for result in results {
            writer.write_record([
                result.part_code.clone(),
                result.process_number.clone().unwrap_or_default(),
                result.process_number_list.join(","),
                date_cell(result.due_date),
                self.num(result.total_inspection_hours),
                result.required_headcount.to_string(),
                result.assigned_headcount.to_string(),
                result.shortage_headcount.to_string(),
                result.members_display(),
                flag_cell(result.is_new_product),
                team_coverage_status(result, &team)
                    .map(|s| s.to_string())
                    .unwrap_or_default(),
                flag_cell(result.skill_info_available),
            ])?;
        }

        writer.flush()?;
        Ok(path)
    }

    pub fn export_workload(&self, kind: ReportKind, workloads: &[InspectorWorkload]) -> ReportResult<PathBuf> {
        let path = self.path_for(kind);
        let mut writer = self.open(&path)?;
        writer.write_record(["氏名", "担当件数", "総検査時間(h)", "平均検査時間(h)"])?;
        for w in workloads {
            writer.write_record([
                w.name.clone(),
                w.task_count.to_string(),
                self.num(w.total_hours),
                self.num(w.average_hours),
            ])?;
        }
        writer.flush()?;
        Ok(path)
    }

    /// 成员明细 (一名成员一行)
    pub fn export_member_detail(&self, kind: ReportKind, results: &[AssignmentResult]) -> ReportResult<PathBuf> {
        let path = self.path_for(kind);
        let mut writer = self.open(&path)?;
        writer.write_record(["品番", "納期", "現在工程番号", "氏名", "区分", "割当時間(h)"])?;
        for result in results {
            for member in &result.assigned_members {
                writer.write_record([
                    result.part_code.clone(),
                    date_cell(result.due_date),
                    result.process_number.clone().unwrap_or_default(),
                    member.name.clone(),
                    member.coverage.to_string(),
                    self.num(member.allocated_hours),
                ])?;
            }
        }
        writer.flush()?;
        Ok(path)
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    fn open(&self, path: &Path) -> ReportResult<Writer<File>> {
        fs::create_dir_all(&self.output_dir).map_err(|e| ReportError::OutputDir {
            path: self.output_dir.display().to_string(),
            message: e.to_string(),
        })?;
        let mut file = File::create(path)?;
        file.write_all(UTF8_BOM)?;
        Ok(Writer::from_writer(file))
    }

    fn num(&self, value: f64) -> String {
        format!("{:.*}", self.decimals, value)
    }
}

fn date_cell(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

fn flag_cell(flag: bool) -> String {
    if flag { "○".to_string() } else { String::new() }
}
