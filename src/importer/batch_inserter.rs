// ==========================================
// 商户数据导入工具 - 批次写入器
// ==========================================
// 职责: 将一个批次渲染为参数化的多行 INSERT,并在共享事务中执行
// 红线: 任一批次失败 → 请求回滚整个事务
// 红线: 批次内部 panic 不得导致进程崩溃
// ==========================================

use crate::domain::{MerchantRecord, MERCHANT_IMPORT_TABLE};
use crate::importer::chunk_planner::Batch;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::BatchWriter;
use crate::repository::{BoundStatement, ImportTransaction, RepositoryError};
use rusqlite::types::Value;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// 每行绑定的参数个数
pub const BOUND_COLUMNS: usize = 5;

/// SQLite 单条语句绑定参数上限（SQLITE_MAX_VARIABLE_NUMBER, 3.32+ 默认值）
pub const SQLITE_MAX_BOUND_PARAMS: usize = 32_766;

/// 单条语句可容纳的最大行数
pub const MAX_ROWS_PER_STATEMENT: usize = SQLITE_MAX_BOUND_PARAMS / BOUND_COLUMNS;

const ROW_PLACEHOLDER: &str = "(?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)";

// ==========================================
// SqliteBatchInserter
// ==========================================
#[derive(Debug, Clone)]
pub struct SqliteBatchInserter {
    max_rows_per_statement: usize,
}

impl Default for SqliteBatchInserter {
    fn default() -> Self {
        Self {
            max_rows_per_statement: MAX_ROWS_PER_STATEMENT,
        }
    }
}

impl SqliteBatchInserter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定单条语句行数上限（不超过 MAX_ROWS_PER_STATEMENT）
    pub fn with_max_rows_per_statement(max_rows: usize) -> Self {
        Self {
            max_rows_per_statement: max_rows.clamp(1, MAX_ROWS_PER_STATEMENT),
        }
    }

    /// 渲染批次
    ///
    /// 行数 × 参数数超出 SQLite 上限时,拆为最少数量的连续多行语句。
    pub fn render(&self, records: &[MerchantRecord]) -> Vec<BoundStatement> {
        records
            .chunks(self.max_rows_per_statement)
            .map(render_statement)
            .collect()
    }
}

fn render_statement(records: &[MerchantRecord]) -> BoundStatement {
    let mut sql = format!(
        "INSERT INTO {} (business_account_id, mobile_phone, balance, expired_at, status, \
         created_at, updated_at) VALUES ",
        MERCHANT_IMPORT_TABLE
    );
    let mut params = Vec::with_capacity(records.len() * BOUND_COLUMNS);

    for (i, record) in records.iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        sql.push_str(ROW_PLACEHOLDER);
        params.push(Value::Integer(i64::from(record.business_account_id)));
        params.push(Value::Integer(record.mobile_phone));
        params.push(Value::Integer(i64::from(record.balance)));
        params.push(Value::Text(record.expired_at.clone()));
        params.push(Value::Integer(i64::from(record.status.as_db_value())));
    }

    BoundStatement { sql, params }
}

impl BatchWriter for SqliteBatchInserter {
    fn write_batch(&self, tx: &ImportTransaction, batch: &Batch) -> ImportResult<usize> {
        // 事务已结束（其他批次失败）时不再渲染
        if !tx.is_active() {
            return Err(ImportError::Repository(RepositoryError::TransactionClosed {
                state: tx.state().to_string(),
            }));
        }

        let statements = self.render(batch.records());
        debug!(
            batch_index = batch.index,
            rows = batch.len(),
            statements = statements.len(),
            "批次渲染完成"
        );

        let affected = tx.execute_all(&statements).map_err(|e| ImportError::BatchFailed {
            batch_index: batch.index,
            message: e.to_string(),
        })?;

        if affected != batch.len() {
            return Err(ImportError::BatchFailed {
                batch_index: batch.index,
                message: format!("写入行数不符: 期望 {}, 实际 {}", batch.len(), affected),
            });
        }
        Ok(affected)
    }
}

// ==========================================
// 批次工作单元
// ==========================================

/// 执行一个批次（工作线程入口）
///
/// - 已取消: 不执行,按失败上报 Cancelled
/// - 写入失败或 panic: 先上报失败,再回滚整个事务
///
/// 先上报后回滚: 其他批次因事务已关闭而失败时,上报顺序一定在真正的失败原因之后。
pub fn run_batch(
    writer: &dyn BatchWriter,
    tx: &ImportTransaction,
    batch: &Batch,
    cancel: &CancellationToken,
    on_failure: impl FnOnce(ImportError),
) -> Option<usize> {
    let result = if cancel.is_cancelled() {
        Err(ImportError::Cancelled)
    } else {
        catch_unwind(AssertUnwindSafe(|| writer.write_batch(tx, batch))).unwrap_or_else(|payload| {
            Err(ImportError::BatchPanicked {
                batch_index: batch.index,
                message: panic_message(payload.as_ref()),
            })
        })
    };

    match result {
        Ok(rows) => Some(rows),
        Err(e) => {
            error!(batch_index = batch.index, error = %e, "插入数据库出错");
            on_failure(e);
            match tx.rollback() {
                Ok(true) => warn!(batch_index = batch.index, "批次失败, 整个事务已回滚"),
                Ok(false) => {}
                Err(rb) => error!(batch_index = batch.index, error = %rb, "回滚失败"),
            }
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
