// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、CSV 生成等功能
// ==========================================

#![allow(dead_code)]

use merchant_import::config::ApplicationOptions;
use merchant_import::db::ensure_import_table;
use merchant_import::domain::MERCHANT_IMPORT_TABLE;
use rusqlite::Connection;
use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化目标表
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - PathBuf: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, PathBuf), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_path_buf();

    let conn = Connection::open(&db_path)?;
    ensure_import_table(&conn)?;

    Ok((temp_file, db_path))
}

/// 写入临时 CSV 文件
pub fn write_csv(content: &str) -> Result<NamedTempFile, Box<dyn Error>> {
    let mut file = NamedTempFile::new()?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// 生成 n 行合法记录（手机号 13800000000 起递增）
pub fn merchant_lines(n: usize) -> String {
    let mut out = String::with_capacity(n * 36);
    for i in 0..n {
        out.push_str(&format!(
            "{},{},2020-01-01 10:00:00\n",
            13_800_000_000i64 + i as i64,
            100 + (i % 1000)
        ));
    }
    out
}

/// 测试用配置
pub fn test_options(db_path: &Path, chunk_size: usize, concurrency: usize) -> ApplicationOptions {
    let mut opts = ApplicationOptions::default();
    opts.database.path = db_path.to_path_buf();
    opts.import.chunk_size = chunk_size;
    opts.import.concurrency = Some(concurrency);
    opts
}

/// 目标表行数
pub fn count_rows(db_path: &Path) -> Result<i64, Box<dyn Error>> {
    let conn = Connection::open(db_path)?;
    let count = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", MERCHANT_IMPORT_TABLE),
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// 安装触发器: 写入指定手机号时中止语句（模拟数据库写入失败）
pub fn install_failure_trigger(db_path: &Path, mobile_phone: i64) -> Result<(), Box<dyn Error>> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch(&format!(
        r#"
        CREATE TRIGGER fail_on_phone
        BEFORE INSERT ON {table}
        WHEN NEW.mobile_phone = {phone}
        BEGIN
            SELECT RAISE(ABORT, 'injected failure');
        END;
        "#,
        table = MERCHANT_IMPORT_TABLE,
        phone = mobile_phone
    ))?;
    Ok(())
}
