// ==========================================
// 商户数据导入工具 - 导入 Trait
// ==========================================
// 职责: 定义导入流程各环节的接口（不包含实现）
// ==========================================

use crate::domain::ImportOutcome;
use crate::importer::chunk_planner::Batch;
use crate::importer::error::ImportResult;
use crate::importer::file_validator::ValidatedFile;
use crate::repository::ImportTransaction;
use async_trait::async_trait;
use std::path::Path;
use tokio_util::sync::CancellationToken;

// ==========================================
// MerchantImporter Trait
// ==========================================
// 用途: 商户导入主接口
// 实现者: MerchantImporterImpl
#[async_trait]
pub trait MerchantImporter: Send + Sync {
    /// 只做格式检查,不触碰数据库
    async fn check_csv(&self, file_path: &Path) -> ImportResult<ValidatedFile>;

    /// 检查 + 导入
    ///
    /// # 导入流程
    /// 1. 逐行检查文件（任意一行错误即终止,数据库未被触碰）
    /// 2. 按固定大小切分批次
    /// 3. 开启唯一事务,并发写入各批次
    /// 4. 全部批次成功才提交,否则整体回滚
    ///
    /// # 返回
    /// - 恰好一个 ImportOutcome（含耗时）
    async fn import_from_csv(&self, file_path: &Path, cancel: CancellationToken) -> ImportOutcome;
}

// ==========================================
// BatchWriter Trait
// ==========================================
// 用途: 将一个批次写入共享事务
// 实现者: SqliteBatchInserter
pub trait BatchWriter: Send + Sync {
    /// 写入一个批次
    ///
    /// # 返回
    /// - Ok(usize): 写入行数（== batch.len()）
    /// - Err: 写入失败（调用方负责请求整体回滚）
    fn write_batch(&self, tx: &ImportTransaction, batch: &Batch) -> ImportResult<usize>;
}

// ==========================================
// 导入事件
// ==========================================

/// 导入过程事件（用于进度展示）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportEvent {
    /// 文件格式检查通过
    Validated { rows: usize },
    /// 批次规划完成
    Planned { batches: usize, concurrency: usize },
    /// 单个批次已写入事务（尚未提交）
    BatchStaged { index: usize, rows: usize },
    /// 单个批次失败
    BatchFailed { index: usize, reason: String },
}

/// 导入事件监听者 Trait
pub trait ImportEventListener: Send + Sync {
    fn on_event(&self, event: ImportEvent);
}

/// 空操作监听者
#[derive(Debug, Clone, Default)]
pub struct NoOpListener;

impl ImportEventListener for NoOpListener {
    fn on_event(&self, event: ImportEvent) {
        tracing::trace!(?event, "NoOpListener: 跳过事件");
    }
}
