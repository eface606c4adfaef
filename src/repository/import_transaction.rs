// ==========================================
// 商户数据导入工具 - 导入事务
// ==========================================
// 红线: 一个导入任务只有一个事务,所有批次写入同一事务
// 红线: 事务结束（提交/回滚）后拒绝任何写入,绝不退化为自动提交
// 并发: 连接由 Mutex 串行化,每个批次在持锁期间完成全部语句
// ==========================================

use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// 事务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Active,
    Committed,
    RolledBack,
}

impl TransactionState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => TransactionState::Active,
            1 => TransactionState::Committed,
            _ => TransactionState::RolledBack,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            TransactionState::Active => 0,
            TransactionState::Committed => 1,
            TransactionState::RolledBack => 2,
        }
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionState::Active => write!(f, "ACTIVE"),
            TransactionState::Committed => write!(f, "COMMITTED"),
            TransactionState::RolledBack => write!(f, "ROLLED_BACK"),
        }
    }
}

/// 带参数的单条 SQL
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
    pub sql: String,
    pub params: Vec<Value>,
}

// ==========================================
// ImportTransaction
// ==========================================
// 状态只在持有连接锁时变更,读状态可无锁
pub struct ImportTransaction {
    conn: Arc<Mutex<Connection>>,
    state: AtomicU8,
}

impl ImportTransaction {
    /// 在共享连接上开启事务（BEGIN IMMEDIATE: 开启即持有写锁）
    pub fn begin(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            guard
                .execute_batch("BEGIN IMMEDIATE")
                .map_err(|e| RepositoryError::DatabaseTransactionError(format!("开启事务失败: {}", e)))?;
        }
        debug!("导入事务已开启");

        Ok(Self {
            conn,
            state: AtomicU8::new(TransactionState::Active.as_u8()),
        })
    }

    pub fn state(&self) -> TransactionState {
        TransactionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_active(&self) -> bool {
        self.state() == TransactionState::Active
    }

    fn set_state(&self, state: TransactionState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    /// 在一次持锁期间依次执行多条语句
    ///
    /// # 返回
    /// - Ok(usize): 影响行数合计
    /// - Err(TransactionClosed): 事务已提交/回滚,或连接已退回自动提交模式
    pub fn execute_all(&self, statements: &[BoundStatement]) -> RepositoryResult<usize> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        self.ensure_active(&conn)?;

        let mut affected = 0;
        for statement in statements {
            let mut stmt = conn.prepare(&statement.sql)?;
            affected += stmt.execute(params_from_iter(statement.params.iter()))?;
        }
        Ok(affected)
    }

    /// 执行单条语句
    pub fn execute(&self, statement: &BoundStatement) -> RepositoryResult<usize> {
        self.execute_all(std::slice::from_ref(statement))
    }

    fn ensure_active(&self, conn: &Connection) -> RepositoryResult<()> {
        let state = self.state();
        if state != TransactionState::Active {
            return Err(RepositoryError::TransactionClosed {
                state: state.to_string(),
            });
        }
        // SQLite 在部分错误（如 IOERR/FULL）后会自行回滚
        if conn.is_autocommit() {
            self.set_state(TransactionState::RolledBack);
            return Err(RepositoryError::TransactionClosed {
                state: "AUTOCOMMIT".to_string(),
            });
        }
        Ok(())
    }

    /// 提交事务
    ///
    /// 提交失败时尽力回滚,事务状态置为 RolledBack。
    pub fn commit(&self) -> RepositoryResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        self.ensure_active(&conn)?;

        match conn.execute_batch("COMMIT") {
            Ok(()) => {
                self.set_state(TransactionState::Committed);
                info!("导入事务已提交");
                Ok(())
            }
            Err(e) => {
                if !conn.is_autocommit() {
                    if let Err(rb) = conn.execute_batch("ROLLBACK") {
                        warn!(error = %rb, "提交失败后回滚失败");
                    }
                }
                self.set_state(TransactionState::RolledBack);
                Err(RepositoryError::DatabaseTransactionError(format!(
                    "提交事务失败: {}",
                    e
                )))
            }
        }
    }

    /// 回滚整个事务（幂等）
    ///
    /// # 返回
    /// - Ok(true): 本次调用完成了回滚
    /// - Ok(false): 事务此前已结束
    pub fn rollback(&self) -> RepositoryResult<bool> {
        let conn = lock_recovering(&self.conn);
        if self.state() != TransactionState::Active {
            return Ok(false);
        }

        self.set_state(TransactionState::RolledBack);
        if conn.is_autocommit() {
            return Ok(true);
        }
        conn.execute_batch("ROLLBACK")
            .map_err(|e| RepositoryError::DatabaseTransactionError(format!("回滚事务失败: {}", e)))?;
        info!("导入事务已回滚");
        Ok(true)
    }
}

impl Drop for ImportTransaction {
    fn drop(&mut self) {
        if self.is_active() {
            warn!("导入事务未显式结束, 执行回滚");
            if let Err(e) = self.rollback() {
                warn!(error = %e, "析构回滚失败");
            }
        }
    }
}

/// 回滚路径上忽略锁中毒: 持锁线程 panic 后仍需释放事务
fn lock_recovering(conn: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_import_table;

    fn shared_conn() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        ensure_import_table(&conn).unwrap();
        Arc::new(Mutex::new(conn))
    }

    fn insert(phone: i64) -> BoundStatement {
        BoundStatement {
            sql: "INSERT INTO merchant_svc_to_imports \
                  (mobile_phone, expired_at, created_at, updated_at) \
                  VALUES (?, '2020-01-01 10:00:00', datetime('now'), datetime('now'))"
                .to_string(),
            params: vec![Value::Integer(phone)],
        }
    }

    fn count(conn: &Arc<Mutex<Connection>>) -> i64 {
        conn.lock()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM merchant_svc_to_imports", [], |r| r.get(0))
            .unwrap()
    }

    #[test]
    fn test_commit_persists_rows() {
        let conn = shared_conn();
        let tx = ImportTransaction::begin(Arc::clone(&conn)).unwrap();
        tx.execute(&insert(1)).unwrap();
        tx.commit().unwrap();

        assert_eq!(tx.state(), TransactionState::Committed);
        assert_eq!(count(&conn), 1);
    }

    #[test]
    fn test_rollback_discards_rows_and_is_idempotent() {
        let conn = shared_conn();
        let tx = ImportTransaction::begin(Arc::clone(&conn)).unwrap();
        tx.execute(&insert(1)).unwrap();

        assert!(tx.rollback().unwrap());
        assert!(!tx.rollback().unwrap());
        assert_eq!(count(&conn), 0);
    }

    #[test]
    fn test_execute_after_rollback_is_refused() {
        let conn = shared_conn();
        let tx = ImportTransaction::begin(Arc::clone(&conn)).unwrap();
        tx.rollback().unwrap();

        let err = tx.execute(&insert(2)).unwrap_err();
        assert!(matches!(err, RepositoryError::TransactionClosed { .. }));
        // 未退化为自动提交
        assert_eq!(count(&conn), 0);
    }

    #[test]
    fn test_drop_without_commit_rolls_back() {
        let conn = shared_conn();
        {
            let tx = ImportTransaction::begin(Arc::clone(&conn)).unwrap();
            tx.execute(&insert(3)).unwrap();
        }
        assert_eq!(count(&conn), 0);
    }
}
