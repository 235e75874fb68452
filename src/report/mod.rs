// ==========================================
// 检查排程系统 - 报表层
// ==========================================
// 职责: 排程结果 → CSV (UTF-8 BOM, Excel 直接打开)
// ==========================================

pub mod csv_exporter;
pub mod error;

pub use csv_exporter::{CsvExporter, ReportKind};
pub use error::{ReportError, ReportResult};
