// ==========================================
// 商户数据导入工具 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use rusqlite::ErrorCode;
use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 连接与锁 =====
    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库忙 (其他进程持有写锁): {0}")]
    DatabaseBusy(String),

    // ===== 事务 =====
    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("事务已结束 (状态: {state}), 拒绝继续执行")]
    TransactionClosed { state: String },

    // ===== 语句执行 =====
    #[error("约束检查失败: {0}")]
    ConstraintViolation(String),

    #[error("数据库执行失败: {0}")]
    DatabaseQueryError(String),
}

// 按 SQLite 错误码归类
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        let message = err.to_string();
        match err.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => RepositoryError::ConstraintViolation(message),
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
                RepositoryError::DatabaseBusy(message)
            }
            Some(ErrorCode::CannotOpen) | Some(ErrorCode::NotADatabase) => {
                RepositoryError::DatabaseConnectionError(message)
            }
            _ => RepositoryError::DatabaseQueryError(message),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_constraint_failure_is_classified() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (phone INTEGER NOT NULL UNIQUE)")
            .unwrap();
        conn.execute("INSERT INTO t (phone) VALUES (1)", []).unwrap();

        let err = conn.execute("INSERT INTO t (phone) VALUES (1)", []).unwrap_err();
        assert!(matches!(
            RepositoryError::from(err),
            RepositoryError::ConstraintViolation(_)
        ));
    }

    #[test]
    fn test_missing_table_is_query_error() {
        let conn = Connection::open_in_memory().unwrap();
        let err = conn.execute("DELETE FROM nowhere", []).unwrap_err();
        assert!(matches!(
            RepositoryError::from(err),
            RepositoryError::DatabaseQueryError(_)
        ));
    }
}
