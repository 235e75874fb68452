// ==========================================
// 检查排程系统 - 数据集加载器
// ==========================================
// 流程: 文件解析 → 字段映射 → (出荷不足) 批次分组
// 缺失处理:
//   - 出荷不足 / 制品主数据: 文件不存在 → FileNotFound
//   - 检查员 / 技能表: 文件不存在 → 诊断 + 空集合, 流程继续
// ==========================================

use crate::config::DataFiles;
use crate::domain::inspector::{Inspector, SkillEntry};
use crate::domain::shortage::{RawProcessMasterRow, ShortageRecord};
use crate::engine::diagnostics::{DiagnosticKind, DiagnosticsSink, Stage};
use crate::engine::orchestrator::ScheduleInputs;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::{RawTable, UniversalFileParser};
use crate::importer::lot_grouper::LotGrouper;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

pub struct DatasetLoader {
    files: DataFiles,
    parser: UniversalFileParser,
    mapper: FieldMapper,
    grouper: LotGrouper,
    sink: Arc<dyn DiagnosticsSink>,
}

impl DatasetLoader {
    pub fn new(files: DataFiles, sink: Arc<dyn DiagnosticsSink>) -> Self {
        Self {
            files,
            parser: UniversalFileParser,
            mapper: FieldMapper::new(sink.clone()),
            grouper: LotGrouper::new(sink.clone()),
            sink,
        }
    }

    /// 加载全部数据集
    #[instrument(skip(self), fields(data_dir = %self.files.data_dir.display()))]
    pub fn load_all(&self) -> ImportResult<ScheduleInputs> {
        let inputs = ScheduleInputs {
            shortages: self.load_shortages()?,
            master_rows: self.load_master()?,
            inspectors: self.load_inspectors()?,
            skills: self.load_skills()?,
        };

        info!(
            shortages = inputs.shortages.len(),
            master_rows = inputs.master_rows.len(),
            inspectors = inputs.inspectors.len(),
            skills = inputs.skills.len(),
            "数据集加载完成"
        );
        Ok(inputs)
    }

    /// 出荷不足 (已分组)
    pub fn load_shortages(&self) -> ImportResult<Vec<ShortageRecord>> {
        let table = self.parser.parse(self.files.shortage_path())?;
        let rows = self.mapper.map_shortages(&table)?;
        Ok(self.grouper.group(rows))
    }

    pub fn load_master(&self) -> ImportResult<Vec<RawProcessMasterRow>> {
        let table = self.parser.parse(self.files.product_master_path())?;
        self.mapper.map_master(&table)
    }

    pub fn load_inspectors(&self) -> ImportResult<Vec<Inspector>> {
        match self.optional_table(&self.files.inspector_path(), DiagnosticKind::MissingData)? {
            Some(table) => self.mapper.map_inspectors(&table),
            None => Ok(Vec::new()),
        }
    }

    pub fn load_skills(&self) -> ImportResult<Vec<SkillEntry>> {
        match self.optional_table(&self.files.skill_path(), DiagnosticKind::UnresolvedReference)? {
            Some(table) => self.mapper.map_skills(&table),
            None => Ok(Vec::new()),
        }
    }

    /// 可选数据集: 文件不存在 → 诊断后返回 None
    fn optional_table(&self, path: &Path, kind: DiagnosticKind) -> ImportResult<Option<RawTable>> {
        match self.parser.parse(path) {
            Ok(table) => Ok(Some(table)),
            Err(ImportError::FileNotFound(p)) => {
                self.sink.emit(kind, Stage::Import, format!("文件不存在, 跳过继续: {}", p));
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
