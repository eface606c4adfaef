// ==========================================
// 商户数据导入工具 - 应用配置
// ==========================================
// 存储: JSON 文件（database / import 两段）
// ==========================================

use crate::db::DEFAULT_BUSY_TIMEOUT_MS;
use crate::importer::chunk_planner::DEFAULT_CHUNK_SIZE;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// 配置文件路径环境变量
pub const CONFIG_ENV_VAR: &str = "MERCHANT_IMPORT_CONFIG";

/// 应用目录名
const APP_DIR: &str = "merchant-import";

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败: {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("配置文件解析失败: {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("配置值错误 (key: {key}): {message}")]
    InvalidValue { key: String, message: String },
}

// ==========================================
// ApplicationOptions - 应用配置
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationOptions {
    pub database: DatabaseOptions,
    pub import: ImportOptions,
}

// ==========================================
// DatabaseOptions - 数据库简单设置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseOptions {
    pub path: PathBuf,          // SQLite 数据库文件
    pub busy_timeout_ms: u64,   // busy_timeout（毫秒）
    pub max_opens: Option<usize>, // 并发写入上限（None: 不额外限制）
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            max_opens: None,
        }
    }
}

// ==========================================
// ImportOptions - 导入参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    pub chunk_size: usize,           // 每批记录数
    pub concurrency: Option<usize>,  // 并发批次数（None: CPU 核数）
    pub business_account_id: i32,    // 写入每条记录的商户账户
    pub create_table: bool,          // 目标表不存在时自动创建
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            concurrency: None,
            business_account_id: 0,
            create_table: false,
        }
    }
}

impl ApplicationOptions {
    /// 加载配置
    ///
    /// # 查找顺序
    /// 1. 显式传入的路径（必须存在）
    /// 2. 环境变量 MERCHANT_IMPORT_CONFIG（必须存在）
    /// 3. <config_dir>/merchant-import/config.json（存在才读取）
    /// 4. 默认值
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Self::from_file(Path::new(path.trim()));
            }
        }

        match default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => {
                debug!("未找到配置文件, 使用默认配置");
                Ok(Self::default())
            }
        }
    }

    /// 从 JSON 文件读取
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let opts: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        info!(path = %path.display(), "配置文件已加载");
        Ok(opts)
    }

    /// 校验配置值
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.import.chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "import.chunk_size".to_string(),
                message: "必须大于 0".to_string(),
            });
        }
        if self.import.concurrency == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "import.concurrency".to_string(),
                message: "必须大于 0".to_string(),
            });
        }
        if self.database.max_opens == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "database.max_opens".to_string(),
                message: "必须大于 0".to_string(),
            });
        }
        Ok(())
    }

    /// 实际使用的并发批次数
    ///
    /// concurrency 未设置时取 CPU 核数; max_opens 作为上限。
    pub fn effective_concurrency(&self) -> usize {
        let wanted = self.import.concurrency.unwrap_or_else(num_cpus::get).max(1);
        match self.database.max_opens {
            Some(cap) => wanted.min(cap.max(1)),
            None => wanted,
        }
    }
}

/// 默认配置文件路径: <config_dir>/merchant-import/config.json
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.json"))
}

/// 默认数据库路径: <data_dir>/merchant-import/merchant.db
fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("merchant.db")
}
