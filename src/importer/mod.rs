// ==========================================
// 商户数据导入工具 - 导入层
// ==========================================
// 职责: CSV 逐行校验,分批并发写入同一事务
// 流程: 解析 → 校验 → 切分 → 写入 → 提交/回滚
// ==========================================

// 模块声明
pub mod batch_inserter;
pub mod chunk_planner;
pub mod commit_coordinator;
pub mod error;
pub mod file_validator;
pub mod importer_trait;
pub mod merchant_importer;
pub mod record_parser;

// 重导出核心类型
pub use batch_inserter::{run_batch, SqliteBatchInserter};
pub use chunk_planner::{plan_batches, Batch, DEFAULT_CHUNK_SIZE};
pub use commit_coordinator::{CommitCoordinator, FailureLatch};
pub use error::{ImportError, ImportResult, ValidationError};
pub use file_validator::{FileValidator, ValidatedFile};
pub use merchant_importer::MerchantImporterImpl;
pub use record_parser::{RawLine, RecordParser};

// 重导出 Trait 接口
pub use importer_trait::{
    BatchWriter, ImportEvent, ImportEventListener, MerchantImporter, NoOpListener,
};
