// ==========================================
// 检查排程系统 - 字段映射器实现
// ==========================================
// 职责: RawTable → 领域记录
// 列定位: 表头别名优先, 找不到时按列位置回退
//   出荷不足: A=纳期 B=品番 E=出荷数 H=不足数 I=生产批次ID J=批次数量
//   制品主数据: B=品番 D=工程号 E=检查时间
//   检查员: 氏名 / 開始時刻 / 終了時刻 / 所属グループ, H=新制品团队
//   技能: A=品番, C 列以后为作业员
// ==========================================

use crate::domain::inspector::{Inspector, SkillEntry};
use crate::domain::shortage::{RawProcessMasterRow, ShortageRecord};
use crate::domain::types::SkillLevel;
use crate::engine::diagnostics::{DiagnosticKind, DiagnosticsSink, Stage};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::RawTable;
use std::collections::HashSet;
use std::sync::Arc;

/// 列定义
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub fallback: Option<usize>,
}

/// 定位一组列: 先按别名, 再按位置回退
/// 已被别名命中的列不参与位置回退
pub fn resolve_columns(table: &RawTable, columns: &[&ColumnDef]) -> Vec<Option<usize>> {
    let by_alias: Vec<Option<usize>> = columns
        .iter()
        .map(|column| table.find_header(column.aliases))
        .collect();
    let claimed: HashSet<usize> = by_alias.iter().flatten().copied().collect();

    columns
        .iter()
        .zip(by_alias)
        .map(|(column, found)| {
            found.or_else(|| {
                column
                    .fallback
                    .filter(|idx| *idx < table.column_count() && !claimed.contains(idx))
            })
        })
        .collect()
}

// ===== 出荷不足 =====
pub const SHORTAGE_DUE_DATE: ColumnDef = ColumnDef {
    name: "due_date",
    aliases: &["納期", "due_date", "due date"],
    fallback: Some(0),
};
pub const SHORTAGE_PART: ColumnDef = ColumnDef {
    name: "part_code",
    aliases: &["品番", "part_code", "part"],
    fallback: Some(1),
};
pub const SHORTAGE_SHIPMENT: ColumnDef = ColumnDef {
    name: "shipment_qty",
    aliases: &["出荷数", "shipment_qty", "shipment"],
    fallback: Some(4),
};
pub const SHORTAGE_QTY: ColumnDef = ColumnDef {
    name: "shortage_qty",
    aliases: &["不足数", "shortage_qty", "shortage"],
    fallback: Some(7),
};
pub const SHORTAGE_LOT_ID: ColumnDef = ColumnDef {
    name: "lot_id",
    aliases: &["生産ロットID", "lot_id"],
    fallback: Some(8),
};
pub const SHORTAGE_LOT_QTY: ColumnDef = ColumnDef {
    name: "lot_qty",
    aliases: &["ロット数量", "lot_qty"],
    fallback: Some(9),
};
pub const SHORTAGE_CURRENT_PROCESS: ColumnDef = ColumnDef {
    name: "current_process_number",
    aliases: &["現在工程番号", "現在工程", "工程番号", "current_process_number", "current_process"],
    fallback: None,
};

// ===== 制品主数据 =====
pub const MASTER_PART: ColumnDef = ColumnDef {
    name: "part_code",
    aliases: &["品番", "part_code", "part"],
    fallback: Some(1),
};
pub const MASTER_PROCESS: ColumnDef = ColumnDef {
    name: "process_number",
    aliases: &["工程番号", "process_number", "process"],
    fallback: Some(3),
};
pub const MASTER_TIME: ColumnDef = ColumnDef {
    name: "inspection_time",
    aliases: &["検査時間", "inspection_time"],
    fallback: Some(4),
};

// ===== 检查员 =====
pub const INSPECTOR_NAME: ColumnDef = ColumnDef {
    name: "name",
    aliases: &["氏名", "name", "inspector"],
    fallback: Some(0),
};
pub const INSPECTOR_START: ColumnDef = ColumnDef {
    name: "shift_start",
    aliases: &["開始時刻", "shift_start", "start"],
    fallback: None,
};
pub const INSPECTOR_END: ColumnDef = ColumnDef {
    name: "shift_end",
    aliases: &["終了時刻", "shift_end", "end"],
    fallback: None,
};
pub const INSPECTOR_GROUP: ColumnDef = ColumnDef {
    name: "group",
    aliases: &["所属グループ", "group"],
    fallback: None,
};
pub const INSPECTOR_NEW_PRODUCT_TEAM: ColumnDef = ColumnDef {
    name: "new_product_team",
    aliases: &["新製品チーム", "new_product_team"],
    fallback: Some(7),
};

/// 技能表: 作业员列的起始位置 (C 列)
pub const SKILL_WORKER_START: usize = 2;

// ==========================================
// FieldMapper - 字段映射器
// ==========================================
pub struct FieldMapper {
    cleaner: DataCleaner,
    sink: Arc<dyn DiagnosticsSink>,
}

impl FieldMapper {
    pub fn new(sink: Arc<dyn DiagnosticsSink>) -> Self {
        Self {
            cleaner: DataCleaner::new(),
            sink,
        }
    }

    // ==========================================
    // 出荷不足 (批次行, 尚未分组)
    // ==========================================
    pub fn map_shortages(&self, table: &RawTable) -> ImportResult<Vec<ShortageRecord>> {
        let dataset = "shortage";
        let cols = resolve_columns(
            table,
            &[
                &SHORTAGE_DUE_DATE,
                &SHORTAGE_PART,
                &SHORTAGE_QTY,
                &SHORTAGE_SHIPMENT,
                &SHORTAGE_LOT_ID,
                &SHORTAGE_LOT_QTY,
                &SHORTAGE_CURRENT_PROCESS,
            ],
        );
        let due_col = require(cols[0], &SHORTAGE_DUE_DATE, dataset)?;
        let part_col = require(cols[1], &SHORTAGE_PART, dataset)?;
        let qty_col = require(cols[2], &SHORTAGE_QTY, dataset)?;
        let (shipment_col, lot_id_col, lot_qty_col, process_col) = (cols[3], cols[4], cols[5], cols[6]);

        let mut records = Vec::with_capacity(table.rows.len());
        let mut missing_part = 0usize;

        for row in 0..table.rows.len() {
            let part_code = match table.cell(row, part_col) {
                Some(p) => p.to_string(),
                None => {
                    missing_part += 1;
                    continue;
                }
            };

            let due_date = match table.cell(row, due_col) {
                Some(raw) => {
                    let parsed = self.cleaner.parse_date(raw);
                    if parsed.is_none() {
                        self.malformed(format!("出荷不足第 {} 行: 无法解析纳期 '{}'", row + 2, raw));
                    }
                    parsed
                }
                None => None,
            };

            let shortage_qty = self.number_or_zero(table.cell(row, qty_col), row, "shortage_qty");
            let shipment_qty = match shipment_col {
                Some(col) => self.number_or_zero(table.cell(row, col), row, "shipment_qty"),
                None => 0.0,
            };
            let lot_qty = lot_qty_col
                .and_then(|col| table.cell(row, col))
                .and_then(|raw| self.cleaner.parse_number(raw));

            records.push(ShortageRecord {
                due_date,
                part_code,
                shipment_qty,
                shortage_qty,
                lot_id: lot_id_col.and_then(|col| self.cleaner.normalize_null(table.cell(row, col))),
                lot_qty,
                current_process_number: process_col
                    .and_then(|col| self.cleaner.normalize_null(table.cell(row, col))),
            });
        }

        if missing_part > 0 {
            self.malformed(format!("出荷不足: 丢弃 {} 行无品番数据", missing_part));
        }
        Ok(records)
    }

    // ==========================================
    // 制品主数据 (检查时间单位未定)
    // ==========================================
    pub fn map_master(&self, table: &RawTable) -> ImportResult<Vec<RawProcessMasterRow>> {
        let dataset = "product_master";
        let cols = resolve_columns(table, &[&MASTER_PART, &MASTER_TIME, &MASTER_PROCESS]);
        let part_col = require(cols[0], &MASTER_PART, dataset)?;
        let time_col = require(cols[1], &MASTER_TIME, dataset)?;
        let process_col = cols[2];

        let rows = (0..table.rows.len())
            .filter_map(|row| {
                let part_code = table.cell(row, part_col)?.to_string();
                // 非数值 → NaN, 单位判定阶段统一丢弃并记录
                let inspection_time_raw = table
                    .cell(row, time_col)
                    .and_then(|raw| self.cleaner.parse_number(raw))
                    .unwrap_or(f64::NAN);
                Some(RawProcessMasterRow {
                    part_code,
                    process_number: process_col
                        .and_then(|col| self.cleaner.normalize_null(table.cell(row, col))),
                    inspection_time_raw,
                })
            })
            .collect();

        Ok(rows)
    }

    // ==========================================
    // 检查员
    // ==========================================
    pub fn map_inspectors(&self, table: &RawTable) -> ImportResult<Vec<Inspector>> {
        let cols = resolve_columns(
            table,
            &[
                &INSPECTOR_NAME,
                &INSPECTOR_START,
                &INSPECTOR_END,
                &INSPECTOR_GROUP,
                &INSPECTOR_NEW_PRODUCT_TEAM,
            ],
        );
        let name_col = require(cols[0], &INSPECTOR_NAME, "inspectors")?;
        let (start_col, end_col, group_col, team_col) = (cols[1], cols[2], cols[3], cols[4]);

        let mut inspectors = Vec::new();
        for row in 0..table.rows.len() {
            let name = match table.cell(row, name_col) {
                Some(n) => n,
                None => continue,
            };

            let shift_start = start_col.and_then(|col| self.shift_time(table.cell(row, col), name));
            let shift_end = end_col.and_then(|col| self.shift_time(table.cell(row, col), name));

            let mut inspector = Inspector::new(name, shift_start, shift_end);
            inspector.group = group_col.and_then(|col| self.cleaner.normalize_null(table.cell(row, col)));
            inspector.is_new_product_team = team_col
                .map(|col| self.cleaner.is_flagged(table.cell(row, col)))
                .unwrap_or(false);
            inspectors.push(inspector);
        }

        Ok(inspectors)
    }

    // ==========================================
    // 技能表 (宽表 → 纵表)
    // ==========================================
    pub fn map_skills(&self, table: &RawTable) -> ImportResult<Vec<SkillEntry>> {
        if table.column_count() == 0 {
            return Err(ImportError::MissingColumn {
                dataset: "skills".to_string(),
                column: "part_code".to_string(),
            });
        }

        let workers: Vec<(usize, String)> = table
            .headers
            .iter()
            .enumerate()
            .skip(SKILL_WORKER_START)
            .filter(|(_, h)| !h.trim().is_empty())
            .map(|(i, h)| (i, h.trim().to_string()))
            .collect();

        let mut entries = Vec::new();
        for row in 0..table.rows.len() {
            let part_code = match table.cell(row, 0) {
                Some(p) => p.to_string(),
                None => continue,
            };
            for (col, worker) in &workers {
                let skill_level = table
                    .cell(row, *col)
                    .and_then(|raw| self.cleaner.parse_number(raw))
                    .and_then(SkillLevel::from_value);
                entries.push(SkillEntry {
                    part_code: part_code.clone(),
                    worker_name: worker.clone(),
                    skill_level,
                });
            }
        }

        tracing::debug!(workers = workers.len(), entries = entries.len(), "技能表已展开");
        Ok(entries)
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    fn number_or_zero(&self, raw: Option<&str>, row: usize, field: &str) -> f64 {
        match raw {
            None => 0.0,
            Some(value) => match self.cleaner.parse_number(value) {
                Some(v) => v,
                None => {
                    self.malformed(format!(
                        "第 {} 行: {} 非数值 '{}', 按 0 处理",
                        row + 2,
                        field,
                        value
                    ));
                    0.0
                }
            },
        }
    }

    fn shift_time(&self, raw: Option<&str>, name: &str) -> Option<chrono::NaiveTime> {
        let raw = raw?;
        let parsed = self.cleaner.parse_shift_time(raw);
        if parsed.is_none() {
            self.malformed(format!(
                "检查员 {}: 无法解析班次时间 '{}', 班次时长按 8h 处理",
                name, raw
            ));
        }
        parsed
    }

    fn malformed(&self, message: String) {
        self.sink.emit(DiagnosticKind::MalformedValue, Stage::Import, message);
    }
}

/// 必须列定位
fn require(resolved: Option<usize>, column: &ColumnDef, dataset: &str) -> ImportResult<usize> {
    resolved.ok_or_else(|| ImportError::MissingColumn {
        dataset: dataset.to_string(),
        column: column.name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::diagnostics::MemorySink;
    use chrono::NaiveDate;

    fn table(headers: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn mapper() -> (FieldMapper, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        (FieldMapper::new(sink.clone()), sink)
    }

    #[test]
    fn test_shortage_by_header_alias() {
        let (mapper, sink) = mapper();
        let t = table(
            &["品番", "納期", "不足数", "現在工程番号", "ロット数量"],
            &[&["P1", "2026-01-16", "-12", "3", "40"], &["", "2026-01-16", "-1", "", ""], &["P2", "bad", "x", "", ""]],
        );
        let records = mapper.map_shortages(&t).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].part_code, "P1");
        assert_eq!(records[0].due_date, NaiveDate::from_ymd_opt(2026, 1, 16));
        assert_eq!(records[0].shortage_qty, -12.0);
        assert_eq!(records[0].lot_qty, Some(40.0));
        // 第 5 列已被 ロット数量 占用, 出荷数不回退到该列
        assert_eq!(records[0].shipment_qty, 0.0);
        assert_eq!(records[0].current_process_number.as_deref(), Some("3"));
        assert_eq!(records[1].due_date, None);
        assert_eq!(records[1].shortage_qty, 0.0);
        // 品番缺失 1 + 日期 1 + 数值 1
        assert_eq!(sink.count_of(DiagnosticKind::MalformedValue), 3);
    }

    #[test]
    fn test_shortage_positional_fallback() {
        let (mapper, _) = mapper();
        let t = table(
            &["c0", "c1", "c2", "c3", "c4", "c5", "c6", "c7", "c8", "c9"],
            &[&["2026-01-16", "P1", "", "", "100", "", "", "-30", "L-1", "20"]],
        );
        let records = mapper.map_shortages(&t).unwrap();

        assert_eq!(records[0].part_code, "P1");
        assert_eq!(records[0].shipment_qty, 100.0);
        assert_eq!(records[0].shortage_qty, -30.0);
        assert_eq!(records[0].lot_id.as_deref(), Some("L-1"));
        assert_eq!(records[0].current_process_number, None);
    }

    #[test]
    fn test_missing_required_column() {
        let (mapper, _) = mapper();
        let t = table(&["a"], &[&["x"]]);
        assert!(matches!(
            mapper.map_shortages(&t),
            Err(ImportError::MissingColumn { .. })
        ));
    }

    #[test]
    fn test_master_positional_columns() {
        let (mapper, _) = mapper();
        let t = table(
            &["no", "part", "name", "proc", "time"],
            &[&["1", "P1", "x", "3.0", "30"], &["2", "P1", "x", "", "abc"]],
        );
        let rows = mapper.map_master(&t).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].process_number.as_deref(), Some("3.0"));
        assert_eq!(rows[0].inspection_time_raw, 30.0);
        assert_eq!(rows[1].process_number, None);
        assert!(rows[1].inspection_time_raw.is_nan());
    }

    #[test]
    fn test_inspectors() {
        let (mapper, sink) = mapper();
        let t = table(
            &["氏名", "開始時刻", "終了時刻", "所属グループ", "e", "f", "g", "新製品チーム"],
            &[
                &["山田", "08:00", "17:00", "G1", "", "", "", "★"],
                &["佐藤", "late", "17:00", "", "", "", "", ""],
            ],
        );
        let inspectors = mapper.map_inspectors(&t).unwrap();

        assert_eq!(inspectors.len(), 2);
        assert!(inspectors[0].is_new_product_team);
        assert_eq!(inspectors[0].group.as_deref(), Some("G1"));
        assert_eq!(inspectors[0].shift_length_hours(), 9.0);
        assert!(!inspectors[1].is_new_product_team);
        assert_eq!(inspectors[1].shift_length_hours(), 8.0);
        assert_eq!(sink.count_of(DiagnosticKind::MalformedValue), 1);
    }

    #[test]
    fn test_skills_wide_table() {
        let (mapper, _) = mapper();
        let t = table(&["品番", "品名", "A", "B", "C"], &[&["P1", "x", "1", "", "2"]]);
        let entries = mapper.map_skills(&t).unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].worker_name, "A");
        assert_eq!(entries[0].skill_level, Some(SkillLevel::L1));
        assert_eq!(entries[1].skill_level, None);
        assert_eq!(entries[2].skill_level, Some(SkillLevel::L2));
    }
}
