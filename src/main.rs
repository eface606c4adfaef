// ==========================================
// 商户数据导入工具 - 命令行主入口
// ==========================================

use anyhow::Context;
use clap::Parser;
use merchant_import::app::{self, Args, EXIT_CONFIG_ERROR};
use merchant_import::logging;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

fn main() -> ExitCode {
    let args = Args::parse();

    // 初始化日志系统
    logging::init();

    tracing::info!("{} v{}", merchant_import::APP_NAME, merchant_import::VERSION);

    let runtime = match tokio::runtime::Runtime::new().context("无法创建异步运行时") {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("错误: {:#}", e);
            return ExitCode::from(EXIT_CONFIG_ERROR);
        }
    };

    let code = runtime.block_on(async {
        let cancel = CancellationToken::new();

        // Ctrl+C: 停止分发剩余批次,整体回滚
        let watcher = cancel.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    eprintln!("\n收到 Ctrl+C, 正在取消导入...");
                    watcher.cancel();
                }
                Err(e) => tracing::warn!(error = %e, "无法监听 Ctrl+C"),
            }
        });

        app::run(args, cancel).await
    });

    ExitCode::from(code)
}
