// ==========================================
// 商户数据导入工具 - 日志初始化
// ==========================================
// 输出: stderr（stdout 留给进度与导入结果）
// 级别: RUST_LOG（默认 info）,例如 RUST_LOG=merchant_import=debug
// 格式: MERCHANT_IMPORT_LOG_JSON=1 时输出 JSON 行
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 日志格式环境变量
pub const LOG_JSON_ENV: &str = "MERCHANT_IMPORT_LOG_JSON";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn from_flag(flag: Option<&str>) -> Self {
        match flag.map(|v| v.trim().to_lowercase()) {
            Some(v) if v == "1" || v == "true" => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

/// 初始化日志系统（命令行入口调用一次）
///
/// ```no_run
/// merchant_import::logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let format = LogFormat::from_flag(std::env::var(LOG_JSON_ENV).ok().as_deref());

    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

/// 初始化测试环境的日志系统（debug 级别,可重复调用）
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
