// ==========================================
// 商户数据导入工具 - 领域模型层
// ==========================================
// 职责: 定义导入记录、状态枚举、导入结果
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod merchant;
pub mod outcome;

// 重导出核心类型
pub use merchant::{MerchantRecord, MerchantStatus, EXPIRED_AT_FORMAT, MERCHANT_IMPORT_TABLE};
pub use outcome::{FailureKind, ImportOutcome};
