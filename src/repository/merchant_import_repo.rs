// ==========================================
// 商户数据导入工具 - 商户导入 Repository
// ==========================================
// 职责: 持有共享连接,开启导入事务,提供只读统计
// 红线: Repository 不含业务规则，只做数据访问
// ==========================================

use crate::config::DatabaseOptions;
use crate::db::{ensure_import_table, open_sqlite_connection};
use crate::domain::MERCHANT_IMPORT_TABLE;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::import_transaction::ImportTransaction;
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

// ==========================================
// MerchantImportRepository
// ==========================================
#[derive(Clone)]
pub struct MerchantImportRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MerchantImportRepository {
    /// 按配置打开数据库
    pub fn open(opts: &DatabaseOptions) -> RepositoryResult<Self> {
        if let Some(parent) = opts.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                RepositoryError::DatabaseConnectionError(format!("{}: {}", parent.display(), e))
            })?;
        }
        let conn = open_sqlite_connection(opts).map_err(|e| {
            RepositoryError::DatabaseConnectionError(format!("{}: {}", opts.path.display(), e))
        })?;
        Ok(Self::from_connection(conn))
    }

    /// 从已有连接创建
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// 创建目标表（若不存在）
    pub fn ensure_table(&self) -> RepositoryResult<()> {
        let conn = self.lock()?;
        ensure_import_table(&conn)?;
        Ok(())
    }

    /// 开启本次导入的唯一事务
    pub fn begin_import(&self) -> RepositoryResult<ImportTransaction> {
        ImportTransaction::begin(Arc::clone(&self.conn))
    }

    /// 目标表行数（未软删除）
    pub fn count_rows(&self) -> RepositoryResult<i64> {
        let conn = self.lock()?;
        let count = conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE deleted_at IS NULL",
                MERCHANT_IMPORT_TABLE
            ),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn lock(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}
