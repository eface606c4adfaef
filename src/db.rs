// ==========================================
// 商户数据导入工具 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// ==========================================

use crate::config::DatabaseOptions;
use crate::domain::MERCHANT_IMPORT_TABLE;
use crate::perf::install_sqlite_tracing;
use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(
    conn: &Connection,
    busy_timeout_ms: u64,
) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(busy_timeout_ms))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(opts: &DatabaseOptions) -> rusqlite::Result<Connection> {
    let mut conn = Connection::open(&opts.path)?;
    configure_sqlite_connection(&conn, opts.busy_timeout_ms)?;
    install_sqlite_tracing(&mut conn);
    Ok(conn)
}

/// 创建导入目标表（若不存在）
///
/// 说明：仅用于新库/测试库初始化，不做结构迁移。
pub fn ensure_import_table(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(&format!(
        r#"
        CREATE TABLE IF NOT EXISTS {table} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            business_account_id INTEGER NOT NULL DEFAULT 0,
            mobile_phone INTEGER NOT NULL,
            balance INTEGER NOT NULL DEFAULT 0,
            expired_at TEXT NOT NULL,
            status INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            deleted_at TEXT
        );
        "#,
        table = MERCHANT_IMPORT_TABLE
    ))
}
