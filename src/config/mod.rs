// ==========================================
// 检查排程系统 - 配置层
// ==========================================
// 职责: 系统配置管理, 支持 JSON 文件 + 环境变量覆写
// ==========================================

pub mod scheduler_config;

// 重导出核心配置
pub use scheduler_config::{env_keys, get_default_config_path, DataFiles, SchedulerConfig};
