// ==========================================
// 商户数据导入工具 - 命令执行
// ==========================================
// 职责: 加载配置 → 构造导入器 → 执行子命令 → 返回退出码
// 退出码: 0 成功, 1 数据库失败/取消, 2 输入错误, 3 配置/启动错误
// ==========================================

use crate::app::cli::{Args, CheckArgs, Commands, ImportArgs};
use crate::app::progress::ConsoleProgress;
use crate::config::ApplicationOptions;
use crate::importer::{MerchantImporter, MerchantImporterImpl, NoOpListener, ValidatedFile};
use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_INPUT_ERROR: u8 = 2;
pub const EXIT_CONFIG_ERROR: u8 = 3;

/// 执行命令行请求的子命令
pub async fn run(args: Args, cancel: CancellationToken) -> u8 {
    match args.command {
        Commands::Import(import) => run_import(args.config.as_deref(), &import, cancel).await,
        Commands::Check(check) => run_check(args.config.as_deref(), &check).await,
    }
}

/// 加载配置并合并命令行参数
fn load_options(
    config: Option<&Path>,
    apply: impl FnOnce(&mut ApplicationOptions),
) -> anyhow::Result<ApplicationOptions> {
    let mut options = ApplicationOptions::load(config).context("加载配置失败")?;
    apply(&mut options);
    options.validate().context("配置校验失败")?;
    Ok(options)
}

async fn run_import(config: Option<&Path>, args: &ImportArgs, cancel: CancellationToken) -> u8 {
    let options = match load_options(config, |o| args.apply_to(o)) {
        Ok(options) => options,
        Err(e) => {
            error!(error = %format!("{:#}", e), "启动失败");
            eprintln!("错误: {:#}", e);
            return EXIT_CONFIG_ERROR;
        }
    };

    info!(
        csv = %args.csv.display(),
        db = %options.database.path.display(),
        chunk_size = options.import.chunk_size,
        concurrency = options.effective_concurrency(),
        "导入参数"
    );

    let importer = MerchantImporterImpl::new(&options, Arc::new(ConsoleProgress::new()));
    let outcome = importer.import_from_csv(&args.csv, cancel).await;
    println!("{}", outcome);
    outcome.exit_code()
}

async fn run_check(config: Option<&Path>, args: &CheckArgs) -> u8 {
    let options = match load_options(config, |o| args.apply_to(o)) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("错误: {:#}", e);
            return EXIT_CONFIG_ERROR;
        }
    };

    let importer = MerchantImporterImpl::new(&options, Arc::new(NoOpListener));
    match importer.check_csv(&args.csv).await {
        Ok(validated) => {
            println!("{}", check_summary(&validated));
            EXIT_SUCCESS
        }
        Err(e) => {
            println!("请检查csv数据格式: {}", e);
            EXIT_INPUT_ERROR
        }
    }
}

/// check 子命令的汇总: 行数、写入的商户账户与首末记录
fn check_summary(validated: &ValidatedFile) -> String {
    let mut summary = format!("格式检查通过, 共 {} 行记录", validated.records.len());
    if let (Some(first), Some(last)) = (validated.records.first(), validated.records.last()) {
        summary.push_str(&format!(
            "\n商户账户: {}\n首行: {} / {} / {}\n末行: {} / {} / {}",
            first.business_account_id,
            first.mobile_phone,
            first.balance,
            first.expired_at,
            last.mobile_phone,
            last.balance,
            last.expired_at
        ));
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MerchantRecord;
    use clap::Parser;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn config_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn test_import_exit_codes() {
        let dir = TempDir::new().unwrap();
        let config = config_file("{}");
        let db = dir.path().join("m.db");
        let good = csv("13800000000,100,2020-01-01 10:00:00\n");
        let bad = csv("13800000000,100\n");

        let import = |file: &NamedTempFile| {
            Args::parse_from([
                "merchant-import",
                "--config",
                config.path().to_str().unwrap(),
                "import",
                "--csv",
                file.path().to_str().unwrap(),
                "--db",
                db.to_str().unwrap(),
                "--create-table",
            ])
        };

        assert_eq!(run(import(&good), CancellationToken::new()).await, EXIT_SUCCESS);
        assert_eq!(run(import(&bad), CancellationToken::new()).await, EXIT_INPUT_ERROR);
    }

    #[tokio::test]
    async fn test_invalid_config_is_startup_error() {
        let config = config_file(r#"{"import": {"chunk_size": 0}}"#);
        let good = csv("13800000000,100,2020-01-01 10:00:00\n");
        let args = Args::parse_from([
            "merchant-import",
            "--config",
            config.path().to_str().unwrap(),
            "check",
            "--csv",
            good.path().to_str().unwrap(),
        ]);

        assert_eq!(run(args, CancellationToken::new()).await, EXIT_CONFIG_ERROR);
    }

    #[tokio::test]
    async fn test_check_reports_input_error() {
        let config = config_file("{}");
        let bad = csv("abc,100,2020-01-01 10:00:00\n");
        let args = Args::parse_from([
            "merchant-import",
            "--config",
            config.path().to_str().unwrap(),
            "check",
            "--csv",
            bad.path().to_str().unwrap(),
        ]);

        assert_eq!(run(args, CancellationToken::new()).await, EXIT_INPUT_ERROR);
    }

    #[test]
    fn test_check_summary_shows_account_and_edges() {
        let validated = ValidatedFile {
            records: vec![
                MerchantRecord::unbound(42, 13800000000, 100, "2020-01-01 10:00:00"),
                MerchantRecord::unbound(42, 13800000001, 5, "2021-06-30 23:59:59"),
            ],
            total_lines: 2,
        };

        let summary = check_summary(&validated);

        assert!(summary.starts_with("格式检查通过, 共 2 行记录"));
        assert!(summary.contains("商户账户: 42"));
        assert!(summary.contains("末行: 13800000001 / 5 / 2021-06-30 23:59:59"));

        let empty = ValidatedFile {
            records: Vec::new(),
            total_lines: 0,
        };
        assert_eq!(check_summary(&empty), "格式检查通过, 共 0 行记录");
    }
}
