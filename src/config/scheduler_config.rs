// ==========================================
// 检查排程系统 - 排程配置
// ==========================================
// 职责: 配置加载 (JSON)、环境变量覆写、校验、快照
// 优先级: 环境变量 > 配置文件 > 缺省值
// ==========================================

use crate::domain::types::{AssignmentOrdering, TimeUnit};
use crate::engine::error::{EngineError, EngineResult};
use crate::importer::error::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 配置键 (环境变量)
pub mod env_keys {
    /// 配置文件路径
    pub const CONFIG_PATH: &str = "INSPECTION_SCHEDULER_CONFIG";
    /// 制品主数据检查时间的强制单位
    pub const TIME_UNIT: &str = "INSPECTION_SCHEDULER_TIME_UNIT";
    /// 分配排序策略
    pub const ORDERING: &str = "INSPECTION_SCHEDULER_ORDERING";
}

// ==========================================
// DataFiles - 输入文件位置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataFiles {
    pub data_dir: PathBuf,
    pub shortage_file: String,
    pub product_master_file: String,
    pub inspector_file: String,
    pub skill_file: String,
}

impl Default for DataFiles {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            shortage_file: "shortage.xlsx".to_string(),
            product_master_file: "product_master.xlsx".to_string(),
            inspector_file: "inspectors.csv".to_string(),
            skill_file: "skills.csv".to_string(),
        }
    }
}

impl DataFiles {
    pub fn shortage_path(&self) -> PathBuf {
        self.data_dir.join(&self.shortage_file)
    }

    pub fn product_master_path(&self) -> PathBuf {
        self.data_dir.join(&self.product_master_file)
    }

    pub fn inspector_path(&self) -> PathBuf {
        self.data_dir.join(&self.inspector_file)
    }

    pub fn skill_path(&self) -> PathBuf {
        self.data_dir.join(&self.skill_file)
    }
}

// ==========================================
// SchedulerConfig - 排程配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// 检查时间强制单位 (seconds/minutes/hours/excel), None = 自动判定
    pub product_master_time_unit: Option<String>,
    /// 一个工作日的时长 (小时)
    pub workday_hours: f64,
    /// 勤务时间无法取得时的缺省值 (小时)
    pub default_shift_hours: f64,
    /// 检查时间完全不明时的缺省值 (小时)
    pub default_inspection_hours: f64,
    pub max_required_headcount: u32,
    /// 紧急任务抽取阈值 (距期限天数)
    pub urgent_filter_days: i64,
    pub assignment_ordering: AssignmentOrdering,
    pub data_files: DataFiles,
    pub output_dir: PathBuf,
    /// 输出 CSV 小时列的小数位
    pub csv_decimals: usize,
    /// 输出文件名是否附加时间戳
    pub timestamp_outputs: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            product_master_time_unit: None,
            workday_hours: 8.0,
            default_shift_hours: 8.0,
            default_inspection_hours: 2.0,
            max_required_headcount: 50,
            urgent_filter_days: 3,
            assignment_ordering: AssignmentOrdering::default(),
            data_files: DataFiles::default(),
            output_dir: PathBuf::from("output"),
            csv_decimals: 2,
            timestamp_outputs: true,
        }
    }
}

impl SchedulerConfig {
    /// 从 JSON 文件加载 (缺失字段取缺省值)
    pub fn load<P: AsRef<Path>>(path: P) -> ImportResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        let raw = std::fs::read_to_string(path)?;
        let config: SchedulerConfig = serde_json::from_str(&raw)
            .map_err(|e| ImportError::ConfigError(format!("{}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), "配置文件已加载");
        Ok(config)
    }

    /// 文件存在则加载, 否则使用缺省值
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> ImportResult<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            tracing::info!(path = %path.as_ref().display(), "配置文件不存在, 使用缺省配置");
            Ok(Self::default())
        }
    }

    /// 环境变量覆写
    pub fn apply_env_overrides(&mut self) {
        if let Ok(unit) = std::env::var(env_keys::TIME_UNIT) {
            let trimmed = unit.trim();
            if !trimmed.is_empty() {
                self.product_master_time_unit = Some(trimmed.to_string());
            }
        }

        if let Ok(ordering) = std::env::var(env_keys::ORDERING) {
            match ordering.parse::<AssignmentOrdering>() {
                Ok(parsed) => self.assignment_ordering = parsed,
                Err(e) => tracing::warn!(value = %ordering, error = %e, "分配排序策略环境变量无效, 忽略"),
            }
        }
    }

    /// 校验
    pub fn validate(&self) -> EngineResult<()> {
        let positive = [
            ("workday_hours", self.workday_hours),
            ("default_shift_hours", self.default_shift_hours),
            ("default_inspection_hours", self.default_inspection_hours),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(EngineError::InvalidConfig(format!(
                    "{} 必须为正数, 实际为 {}",
                    name, value
                )));
            }
        }

        if self.max_required_headcount == 0 {
            return Err(EngineError::InvalidConfig(
                "max_required_headcount 至少为 1".to_string(),
            ));
        }

        if let Some(unit) = &self.product_master_time_unit {
            if unit.parse::<TimeUnit>().is_err() {
                // 运行时会警告并回退到自动判定, 此处仅记录
                tracing::warn!(unit = %unit, "product_master_time_unit 无法识别");
            }
        }

        Ok(())
    }

    /// 配置快照 (JSON), 运行结果中记录
    pub fn snapshot_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// 缺省配置文件路径
///
/// 优先 INSPECTION_SCHEDULER_CONFIG, 其次用户配置目录, 最后当前目录
pub fn get_default_config_path() -> PathBuf {
    if let Ok(path) = std::env::var(env_keys::CONFIG_PATH) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }

    match dirs::config_dir() {
        Some(dir) => dir.join("inspection-scheduler").join("config.json"),
        None => PathBuf::from("./inspection_scheduler.json"),
    }
}
