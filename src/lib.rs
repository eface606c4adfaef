// ==========================================
// 商户数据导入工具 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + tokio
// 系统定位: 逐行校验 CSV,全部正确后在单个事务内并发分批导入
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 记录与结果
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 校验/切分/写入/提交
pub mod importer;

// 配置层 - 应用配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// SQL 计数与慢查询
pub mod perf;

// 日志系统
pub mod logging;

// 应用层 - 命令行
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

pub use config::ApplicationOptions;
pub use domain::{FailureKind, ImportOutcome, MerchantRecord, MerchantStatus};
pub use importer::{ImportError, MerchantImporter, MerchantImporterImpl, ValidationError};
pub use repository::{MerchantImportRepository, RepositoryError};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "商户数据导入工具";
