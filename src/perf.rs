// ==========================================
// 商户数据导入工具 - SQL 性能统计
// ==========================================
// 开关: MERCHANT_IMPORT_PERF_SQL（Debug 默认开启, Release 默认关闭）
// 阈值: MERCHANT_IMPORT_SLOW_SQL_MS（慢 SQL 毫秒数）
// 计数器是进程级的: 批次写入发生在多个工作线程上
// ==========================================

use rusqlite::Connection;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// SQL 统计开关环境变量
pub const PERF_SQL_ENV: &str = "MERCHANT_IMPORT_PERF_SQL";

/// 慢 SQL 阈值环境变量
pub const SLOW_SQL_ENV: &str = "MERCHANT_IMPORT_SLOW_SQL_MS";

/// 单条慢 SQL 日志中保留的最大字节数
const SQL_LOG_MAX_BYTES: usize = 240;

static ENABLED: AtomicBool = AtomicBool::new(false);
static SLOW_THRESHOLD_MS: AtomicU64 = AtomicU64::new(0);
static STATEMENTS: AtomicU64 = AtomicU64::new(0);
static SLOW_STATEMENTS: AtomicU64 = AtomicU64::new(0);

// ==========================================
// PerfSettings - 统计开关与阈值
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PerfSettings {
    enabled: bool,
    slow_ms: u64,
}

impl PerfSettings {
    fn from_env() -> Self {
        Self::parse(
            std::env::var(PERF_SQL_ENV).ok().as_deref(),
            std::env::var(SLOW_SQL_ENV).ok().as_deref(),
        )
    }

    fn parse(enabled: Option<&str>, slow_ms: Option<&str>) -> Self {
        let enabled = match enabled {
            Some(v) => matches!(
                v.trim().to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            ),
            None => cfg!(debug_assertions),
        };
        let slow_ms = slow_ms
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(if cfg!(debug_assertions) { 50 } else { 200 });
        Self { enabled, slow_ms }
    }
}

/// 安装 SQLite 语句 trace/profile（语句计数 + 慢 SQL 日志）
pub fn install_sqlite_tracing(conn: &mut Connection) {
    let settings = PerfSettings::from_env();
    ENABLED.store(settings.enabled, Ordering::Relaxed);

    if !settings.enabled {
        conn.trace(None);
        conn.profile(None);
        return;
    }

    SLOW_THRESHOLD_MS.store(settings.slow_ms, Ordering::Relaxed);
    conn.trace(Some(on_statement));
    conn.profile(Some(on_statement_done));
}

fn on_statement(_sql: &str) {
    if ENABLED.load(Ordering::Relaxed) {
        STATEMENTS.fetch_add(1, Ordering::Relaxed);
    }
}

fn on_statement_done(sql: &str, duration: Duration) {
    if !ENABLED.load(Ordering::Relaxed) {
        return;
    }

    let ms = duration.as_millis() as u64;
    let threshold = SLOW_THRESHOLD_MS.load(Ordering::Relaxed);
    if threshold == 0 || ms < threshold {
        return;
    }

    SLOW_STATEMENTS.fetch_add(1, Ordering::Relaxed);
    // 多行 INSERT 很长,只保留开头
    tracing::warn!(
        target: "slow_sql",
        duration_ms = ms,
        sql = %abbreviate(sql, SQL_LOG_MAX_BYTES),
        "slow sql"
    );
}

fn abbreviate(sql: &str, max_bytes: usize) -> String {
    let flat = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.len() <= max_bytes {
        return flat;
    }
    let cut = (0..=max_bytes)
        .rev()
        .find(|&i| flat.is_char_boundary(i))
        .unwrap_or(0);
    format!("{}…", &flat[..cut])
}

// ==========================================
// SqlCounters - 计数快照
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqlCounters {
    pub statements: u64,
    pub slow_statements: u64,
}

impl SqlCounters {
    /// 当前进程级计数
    pub fn snapshot() -> Self {
        Self {
            statements: STATEMENTS.load(Ordering::Relaxed),
            slow_statements: SLOW_STATEMENTS.load(Ordering::Relaxed),
        }
    }

    /// 自 earlier 以来的增量
    pub fn since(self, earlier: SqlCounters) -> SqlCounters {
        SqlCounters {
            statements: self.statements.saturating_sub(earlier.statements),
            slow_statements: self.slow_statements.saturating_sub(earlier.slow_statements),
        }
    }
}

/// 阶段耗时 Guard: 析构时记录 elapsed_ms 与该阶段的 SQL 计数
///
/// ```ignore
/// let _perf = merchant_import::perf::PerfGuard::new("insert_phase");
/// ```
pub struct PerfGuard {
    phase: &'static str,
    start: Instant,
    base: SqlCounters,
}

impl PerfGuard {
    pub fn new(phase: &'static str) -> Self {
        Self {
            phase,
            start: Instant::now(),
            base: SqlCounters::snapshot(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let delta = SqlCounters::snapshot().since(self.base);
        tracing::info!(
            target: "perf",
            phase = self.phase,
            elapsed_ms = self.elapsed().as_millis() as u64,
            sql_count = delta.statements,
            slow_sql_count = delta.slow_statements,
            "done"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abbreviate_flattens_and_respects_char_boundary() {
        let sql = "INSERT INTO t\n    VALUES ('商户')";
        assert_eq!(abbreviate(sql, 420), "INSERT INTO t VALUES ('商户')");

        let short = abbreviate(sql, 24);
        assert!(short.ends_with('…'));
        assert!(short.len() <= 24 + '…'.len_utf8());
    }

    #[test]
    fn test_settings_parse() {
        let on = PerfSettings::parse(Some(" ON "), Some("75"));
        assert_eq!(on, PerfSettings { enabled: true, slow_ms: 75 });

        let off = PerfSettings::parse(Some("0"), Some("not-a-number"));
        assert!(!off.enabled);
        assert!(off.slow_ms > 0);
    }

    #[test]
    fn test_counters_since() {
        let earlier = SqlCounters {
            statements: 10,
            slow_statements: 1,
        };
        let later = SqlCounters {
            statements: 14,
            slow_statements: 1,
        };
        assert_eq!(
            later.since(earlier),
            SqlCounters {
                statements: 4,
                slow_statements: 0
            }
        );
        assert_eq!(earlier.since(later).statements, 0);
    }
}
