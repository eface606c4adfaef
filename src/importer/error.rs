// ==========================================
// 商户数据导入工具 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use crate::repository::RepositoryError;
use thiserror::Error;

// ==========================================
// ValidationError - 单行校验失败
// ==========================================
// 红线: 任意一行出现 ValidationError,整个导入任务作废
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("缺少字段 (行 {line}): {value:?}")]
    MissingFields { line: usize, value: String },

    #[error("字段数量不对 (行 {line}): 期望 3, 实际 {found}, 原始行 {value:?}")]
    WrongFieldCount {
        line: usize,
        found: usize,
        value: String,
    },

    #[error("字段类型 phone 错误 (行 {line}), 字段值: {value}")]
    InvalidPhone { line: usize, value: String },

    #[error("字段类型 balance 错误 (行 {line}), 字段值: {value}")]
    InvalidBalance { line: usize, value: String },

    #[error("字段类型 expired_at 错误 (行 {line}): 期望 YYYY-MM-DD HH:MM:SS, 字段值: {value}")]
    InvalidExpiry { line: usize, value: String },
}

impl ValidationError {
    /// 出错行号（从 1 开始）
    pub fn line(&self) -> usize {
        match self {
            ValidationError::MissingFields { line, .. }
            | ValidationError::WrongFieldCount { line, .. }
            | ValidationError::InvalidPhone { line, .. }
            | ValidationError::InvalidBalance { line, .. }
            | ValidationError::InvalidExpiry { line, .. } => *line,
        }
    }

    /// 出错的原始值（字段值或整行）
    pub fn value(&self) -> &str {
        match self {
            ValidationError::MissingFields { value, .. }
            | ValidationError::WrongFieldCount { value, .. }
            | ValidationError::InvalidPhone { value, .. }
            | ValidationError::InvalidBalance { value, .. }
            | ValidationError::InvalidExpiry { value, .. } => value,
        }
    }

    /// 简短原因
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::MissingFields { .. } => "missing fields",
            ValidationError::WrongFieldCount { .. } => "wrong field count",
            ValidationError::InvalidPhone { .. } => "invalid phone",
            ValidationError::InvalidBalance { .. } => "invalid balance",
            ValidationError::InvalidExpiry { .. } => "invalid expiry",
        }
    }
}

// ==========================================
// ImportError - 导入流程错误
// ==========================================
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件打开失败: {path}: {source}")]
    FileOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("文件读取失败: {path}, 已读取 {line} 行: {source}")]
    FileRead {
        path: String,
        line: usize,
        #[source]
        source: std::io::Error,
    },

    // ===== 数据校验错误 =====
    #[error("{0}")]
    Validation(#[from] ValidationError),

    // ===== 配置错误 =====
    #[error("配置值错误 (key: {key}): {message}")]
    ConfigValueError { key: String, message: String },

    // ===== 数据库错误 =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("批次 {batch_index} 写入失败: {message}")]
    BatchFailed { batch_index: usize, message: String },

    #[error("批次 {batch_index} 执行异常: {message}")]
    BatchPanicked { batch_index: usize, message: String },

    #[error("事务提交失败: {0}")]
    CommitFailed(String),

    // ===== 取消 =====
    #[error("导入已取消")]
    Cancelled,

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ImportError {
    /// 是否属于输入错误（文件/格式）,此类错误发生时数据库未被触碰
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ImportError::FileOpen { .. }
                | ImportError::FileRead { .. }
                | ImportError::Validation(_)
        )
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
