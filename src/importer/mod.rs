// ==========================================
// 检查排程系统 - 导入层
// ==========================================
// 职责: 外部文件 → 领域记录 (出荷不足 / 制品主数据 / 检查员 / 技能)
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod dataset_loader;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod lot_grouper;

// 重导出核心类型
pub use data_cleaner::DataCleaner;
pub use dataset_loader::DatasetLoader;
pub use error::{ImportError, ImportResult};
pub use field_mapper::{ColumnDef, FieldMapper};
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawTable, UniversalFileParser};
pub use lot_grouper::LotGrouper;
