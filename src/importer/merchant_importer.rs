// ==========================================
// 商户数据导入工具 - 商户导入器实现
// ==========================================
// 职责: 整合导入流程,从文件到数据库
// 流程: 逐行校验 → 切分批次 → 开启事务 → 并发写入 → 提交/回滚
// 红线: 校验未全部通过前不打开数据库
// ==========================================

use crate::config::{ApplicationOptions, DatabaseOptions};
use crate::domain::{FailureKind, ImportOutcome, MerchantRecord};
use crate::importer::batch_inserter::SqliteBatchInserter;
use crate::importer::chunk_planner::plan_batches;
use crate::importer::commit_coordinator::CommitCoordinator;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_validator::{FileValidator, ValidatedFile};
use crate::importer::importer_trait::{
    BatchWriter, ImportEvent, ImportEventListener, MerchantImporter,
};
use crate::importer::record_parser::RecordParser;
use crate::perf::PerfGuard;
use crate::repository::MerchantImportRepository;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// MerchantImporterImpl - 商户导入器实现
// ==========================================
pub struct MerchantImporterImpl {
    validator: FileValidator,
    database: DatabaseOptions,
    create_table: bool,
    chunk_size: usize,
    coordinator: CommitCoordinator,
    listener: Arc<dyn ImportEventListener>,
}

impl MerchantImporterImpl {
    /// 按应用配置创建（使用 SQLite 批量写入器）
    pub fn new(options: &ApplicationOptions, listener: Arc<dyn ImportEventListener>) -> Self {
        Self::with_writer(options, Arc::new(SqliteBatchInserter::new()), listener)
    }

    /// 指定批次写入器创建
    pub fn with_writer(
        options: &ApplicationOptions,
        writer: Arc<dyn BatchWriter>,
        listener: Arc<dyn ImportEventListener>,
    ) -> Self {
        let concurrency = options.effective_concurrency();
        Self {
            validator: FileValidator::new(RecordParser::new(options.import.business_account_id)),
            database: options.database.clone(),
            create_table: options.import.create_table,
            chunk_size: options.import.chunk_size,
            coordinator: CommitCoordinator::new(writer, Arc::clone(&listener), concurrency),
            listener,
        }
    }

    async fn validate(&self, file_path: &Path) -> ImportResult<ValidatedFile> {
        let validator = self.validator;
        let path = file_path.to_path_buf();
        tokio::task::spawn_blocking(move || {
            let _perf = PerfGuard::new("validate_phase");
            validator.validate_file(&path)
        })
        .await
        .map_err(|e| ImportError::InternalError(format!("校验任务异常: {}", e)))?
    }

    async fn open_repository(&self) -> ImportResult<MerchantImportRepository> {
        let database = self.database.clone();
        let create_table = self.create_table;
        tokio::task::spawn_blocking(move || -> ImportResult<MerchantImportRepository> {
            let repo = MerchantImportRepository::open(&database)?;
            if create_table {
                repo.ensure_table()?;
            }
            Ok(repo)
        })
        .await
        .map_err(|e| ImportError::InternalError(format!("打开数据库任务异常: {}", e)))?
    }

    /// 写入阶段: 切分 → 打开数据库 → 协调提交
    async fn insert(
        &self,
        records: Vec<MerchantRecord>,
        cancel: CancellationToken,
    ) -> ImportResult<(usize, usize)> {
        let batches = plan_batches(Arc::from(records), self.chunk_size)?;
        let batch_count = batches.len();
        self.listener.on_event(ImportEvent::Planned {
            batches: batch_count,
            concurrency: self.coordinator.concurrency(),
        });

        if cancel.is_cancelled() {
            return Err(ImportError::Cancelled);
        }

        let repo = self.open_repository().await?;
        let rows = self.coordinator.run(repo, batches, cancel).await?;
        Ok((rows, batch_count))
    }
}

/// 错误 → 失败类别
fn classify(err: &ImportError) -> FailureKind {
    match err {
        ImportError::Cancelled => FailureKind::Cancelled,
        ImportError::ConfigValueError { .. } => FailureKind::Input,
        e if e.is_input_error() => FailureKind::Input,
        _ => FailureKind::Database,
    }
}

#[async_trait]
impl MerchantImporter for MerchantImporterImpl {
    #[instrument(skip(self, file_path), fields(path = %file_path.display()))]
    async fn check_csv(&self, file_path: &Path) -> ImportResult<ValidatedFile> {
        let validated = self.validate(file_path).await?;
        self.listener.on_event(ImportEvent::Validated {
            rows: validated.records.len(),
        });
        info!(rows = validated.records.len(), "格式检查通过");
        Ok(validated)
    }

    #[instrument(skip(self, file_path, cancel), fields(job_id))]
    async fn import_from_csv(&self, file_path: &Path, cancel: CancellationToken) -> ImportOutcome {
        let start_time = Instant::now();
        let job_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("job_id", job_id.as_str());
        info!(file_path = %file_path.display(), chunk_size = self.chunk_size, "开始导入商户数据");

        // === 步骤 1: 逐行校验 ===
        debug!("步骤 1: 逐行校验");
        let records = match self.validate(file_path).await {
            Ok(validated) => validated.records,
            Err(e) => {
                warn!(error = %e, "格式检查失败, 数据库未做任何改动");
                return ImportOutcome::Failed {
                    kind: classify(&e),
                    reason: e.to_string(),
                    rows_read: 0,
                    elapsed: start_time.elapsed(),
                };
            }
        };

        let rows_read = records.len();
        self.listener.on_event(ImportEvent::Validated { rows: rows_read });
        info!(rows = rows_read, "格式检查通过");

        if rows_read == 0 {
            info!("文件无记录, 跳过写入");
            return ImportOutcome::Succeeded {
                rows: 0,
                batches: 0,
                elapsed: start_time.elapsed(),
            };
        }

        // === 步骤 2: 分批并发写入同一事务 ===
        debug!("步骤 2: 分批写入");
        match self.insert(records, cancel).await {
            Ok((rows, batches)) => {
                let elapsed = start_time.elapsed();
                info!(rows, batches, elapsed_ms = elapsed.as_millis() as u64, "导入完成");
                ImportOutcome::Succeeded {
                    rows,
                    batches,
                    elapsed,
                }
            }
            Err(e) => {
                let elapsed = start_time.elapsed();
                let kind = classify(&e);
                error!(error = %e, %kind, elapsed_ms = elapsed.as_millis() as u64, "导入失败, 事务已回滚");
                ImportOutcome::Failed {
                    kind,
                    reason: e.to_string(),
                    rows_read,
                    elapsed,
                }
            }
        }
    }
}
