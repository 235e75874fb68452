// ==========================================
// 检查排程系统 - 报表模块错误类型
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("输出目录创建失败: {path}: {message}")]
    OutputDir { path: String, message: String },

    #[error("文件写入失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV 写入失败: {0}")]
    Csv(#[from] csv::Error),
}

pub type ReportResult<T> = Result<T, ReportError>;
