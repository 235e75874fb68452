// ==========================================
// 检查排程系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 仅"必须数据集完全缺失"上报为运行失败, 其余均在本地降级处理
// ==========================================

use std::fmt;
use thiserror::Error;

/// 必须数据集
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Shortage,
    ProcessMaster,
    Inspectors,
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dataset::Shortage => write!(f, "shortage"),
            Dataset::ProcessMaster => write!(f, "process_master"),
            Dataset::Inspectors => write!(f, "inspectors"),
        }
    }
}

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("必须数据缺失: {dataset} 为空或不存在")]
    MissingData { dataset: Dataset },

    #[error("配置无效: {0}")]
    InvalidConfig(String),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
