// ==========================================
// 商户数据导入工具 - 提交协调器
// ==========================================
// 职责: 开启唯一事务 → 有界并发分发批次 → 等待全部批次 → 提交或回滚
// 红线: 任何工作线程仍在运行时不得提交
// 红线: 多个批次同时失败时不得阻塞（首个失败生效,其余丢弃）
// ==========================================

use crate::importer::batch_inserter::run_batch;
use crate::importer::chunk_planner::Batch;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::{BatchWriter, ImportEvent, ImportEventListener};
use crate::perf::PerfGuard;
use crate::repository::{ImportTransaction, MerchantImportRepository};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

// ==========================================
// FailureLatch - 首个失败锁存
// ==========================================
#[derive(Debug, Default)]
pub struct FailureLatch {
    tripped: AtomicBool,
    first: Mutex<Option<ImportError>>,
    discarded: AtomicUsize,
}

impl FailureLatch {
    /// 记录失败,返回是否为首个失败
    pub fn record(&self, err: ImportError) -> bool {
        let mut slot = self.first.lock().unwrap_or_else(|p| p.into_inner());
        if slot.is_none() {
            *slot = Some(err);
            self.tripped.store(true, Ordering::Release);
            true
        } else {
            debug!(error = %err, "后续失败已丢弃");
            self.discarded.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped.load(Ordering::Acquire)
    }

    pub fn discarded(&self) -> usize {
        self.discarded.load(Ordering::Relaxed)
    }

    pub fn take(&self) -> Option<ImportError> {
        self.first.lock().unwrap_or_else(|p| p.into_inner()).take()
    }
}

// ==========================================
// CommitCoordinator
// ==========================================
pub struct CommitCoordinator {
    writer: Arc<dyn BatchWriter>,
    listener: Arc<dyn ImportEventListener>,
    concurrency: usize,
}

impl CommitCoordinator {
    pub fn new(
        writer: Arc<dyn BatchWriter>,
        listener: Arc<dyn ImportEventListener>,
        concurrency: usize,
    ) -> Self {
        Self {
            writer,
            listener,
            concurrency: concurrency.max(1),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// 执行写入阶段
    ///
    /// # 返回
    /// - Ok(rows): 全部批次成功且事务已提交
    /// - Err: 首个失败原因（事务已回滚）
    #[instrument(skip_all, fields(batches = batches.len(), concurrency = self.concurrency))]
    pub async fn run(
        &self,
        repo: MerchantImportRepository,
        batches: Vec<Batch>,
        cancel: CancellationToken,
    ) -> ImportResult<usize> {
        if batches.is_empty() {
            debug!("无批次, 跳过写入阶段");
            return Ok(0);
        }

        let _perf = PerfGuard::new("insert_phase");
        let expected: usize = batches.iter().map(Batch::len).sum();

        // === 开启唯一事务 ===
        let tx = tokio::task::spawn_blocking(move || repo.begin_import())
            .await
            .map_err(|e| ImportError::InternalError(format!("开启事务任务异常: {}", e)))??;
        let tx = Arc::new(tx);

        let latch = Arc::new(FailureLatch::default());
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut workers = JoinSet::new();
        let total_batches = batches.len();

        // === 有界分发 ===
        for batch in batches {
            if latch.is_tripped() || cancel.is_cancelled() {
                break;
            }

            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                permit = Arc::clone(&semaphore).acquire_owned() => permit,
            };
            let permit = match permit {
                Ok(p) => p,
                Err(e) => {
                    latch.record(ImportError::InternalError(format!("并发许可获取失败: {}", e)));
                    break;
                }
            };
            if latch.is_tripped() {
                break;
            }

            let writer = Arc::clone(&self.writer);
            let listener = Arc::clone(&self.listener);
            let tx = Arc::clone(&tx);
            let latch = Arc::clone(&latch);
            let cancel = cancel.clone();
            workers.spawn_blocking(move || {
                let _permit = permit;
                let index = batch.index;
                let rows = run_batch(writer.as_ref(), &tx, &batch, &cancel, |e| {
                    listener.on_event(ImportEvent::BatchFailed {
                        index,
                        reason: e.to_string(),
                    });
                    latch.record(e);
                });
                if let Some(rows) = rows {
                    listener.on_event(ImportEvent::BatchStaged { index, rows });
                }
                rows
            });
        }

        let dispatched = workers.len();
        if dispatched < total_batches {
            warn!(dispatched, total_batches, "停止分发剩余批次");
        }

        // === 屏障: 等待全部工作线程 ===
        let mut staged = 0usize;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(Some(rows)) => staged += rows,
                Ok(None) => {}
                Err(join_err) => {
                    error!(error = %join_err, "批次任务异常退出");
                    latch.record(ImportError::InternalError(format!(
                        "批次任务异常退出: {}",
                        join_err
                    )));
                }
            }
        }

        if cancel.is_cancelled() {
            latch.record(ImportError::Cancelled);
        }
        if latch.discarded() > 0 {
            debug!(discarded = latch.discarded(), "多个失败, 仅保留首个");
        }

        // === 决策: 提交或回滚 ===
        if let Some(err) = latch.take() {
            rollback_defensively(Arc::clone(&tx)).await;
            return Err(err);
        }

        if staged != expected {
            rollback_defensively(Arc::clone(&tx)).await;
            return Err(ImportError::InternalError(format!(
                "写入行数不符: 期望 {}, 实际 {}",
                expected, staged
            )));
        }

        let committing = Arc::clone(&tx);
        tokio::task::spawn_blocking(move || committing.commit())
            .await
            .map_err(|e| ImportError::InternalError(format!("提交任务异常: {}", e)))?
            .map_err(|e| ImportError::CommitFailed(e.to_string()))?;

        info!(rows = staged, batches = total_batches, "全部批次已提交");
        Ok(staged)
    }
}

async fn rollback_defensively(tx: Arc<ImportTransaction>) {
    let result = tokio::task::spawn_blocking(move || tx.rollback()).await;
    match result {
        Ok(Ok(true)) => info!("协调器回滚事务"),
        Ok(Ok(false)) => debug!("事务已由失败批次回滚"),
        Ok(Err(e)) => error!(error = %e, "协调器回滚失败"),
        Err(e) => error!(error = %e, "回滚任务异常"),
    }
}
