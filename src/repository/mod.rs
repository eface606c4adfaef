// ==========================================
// 商户数据导入工具 - 数据仓储层
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有写入使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod import_transaction;
pub mod merchant_import_repo;

pub use error::{RepositoryError, RepositoryResult};
pub use import_transaction::{BoundStatement, ImportTransaction, TransactionState};
pub use merchant_import_repo::MerchantImportRepository;
