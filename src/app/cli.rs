// ==========================================
// 商户数据导入工具 - 命令行参数
// ==========================================
// 工具: clap derive
// 约定: 命令行参数覆盖配置文件中的同名项
// ==========================================

use crate::config::ApplicationOptions;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// 商户数据导入工具
///
/// 逐行检查 CSV（phone,balance,expired_at）,全部正确后在一个事务内并发分批写入数据库。
#[derive(Debug, Clone, Parser)]
#[command(name = "merchant-import", version, about = "商户数据导入工具: CSV 校验 + 并发分批事务导入")]
pub struct Args {
    /// 配置文件路径（JSON）
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// 检查并导入 CSV 文件
    Import(ImportArgs),
    /// 只检查 CSV 格式,不连接数据库
    Check(CheckArgs),
}

#[derive(Debug, Clone, Parser)]
pub struct ImportArgs {
    /// CSV 文件路径
    #[arg(long = "csv", value_name = "PATH")]
    pub csv: PathBuf,

    /// SQLite 数据库文件（覆盖配置 database.path）
    #[arg(long = "db", value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// 每批记录数
    #[arg(long = "chunk-size", value_name = "N")]
    pub chunk_size: Option<usize>,

    /// 同时写入的批次数
    #[arg(long = "concurrency", value_name = "N")]
    pub concurrency: Option<usize>,

    /// 写入每条记录的商户账户 ID
    #[arg(long = "business-account-id", value_name = "N")]
    pub business_account_id: Option<i32>,

    /// 目标表不存在时自动创建
    #[arg(long = "create-table")]
    pub create_table: bool,
}

#[derive(Debug, Clone, Parser)]
pub struct CheckArgs {
    /// CSV 文件路径
    #[arg(long = "csv", value_name = "PATH")]
    pub csv: PathBuf,

    /// 写入每条记录的商户账户 ID（显示在检查汇总中）
    #[arg(long = "business-account-id", value_name = "N")]
    pub business_account_id: Option<i32>,
}

impl ImportArgs {
    /// 将命令行参数合并进配置
    pub fn apply_to(&self, options: &mut ApplicationOptions) {
        if let Some(db) = &self.db {
            options.database.path = db.clone();
        }
        if let Some(chunk_size) = self.chunk_size {
            options.import.chunk_size = chunk_size;
        }
        if let Some(concurrency) = self.concurrency {
            options.import.concurrency = Some(concurrency);
        }
        if let Some(id) = self.business_account_id {
            options.import.business_account_id = id;
        }
        if self.create_table {
            options.import.create_table = true;
        }
    }
}

impl CheckArgs {
    pub fn apply_to(&self, options: &mut ApplicationOptions) {
        if let Some(id) = self.business_account_id {
            options.import.business_account_id = id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_import_with_overrides() {
        let args = Args::try_parse_from([
            "merchant-import",
            "--config",
            "/tmp/c.json",
            "import",
            "--csv",
            "data.csv",
            "--db",
            "m.db",
            "--chunk-size",
            "500",
            "--concurrency",
            "4",
            "--create-table",
        ])
        .unwrap();

        assert_eq!(args.config, Some(PathBuf::from("/tmp/c.json")));
        let Commands::Import(import) = args.command else {
            panic!("应解析为 import 子命令");
        };

        let mut opts = ApplicationOptions::default();
        opts.import.business_account_id = 7;
        import.apply_to(&mut opts);

        assert_eq!(import.csv, PathBuf::from("data.csv"));
        assert_eq!(opts.database.path, PathBuf::from("m.db"));
        assert_eq!(opts.import.chunk_size, 500);
        assert_eq!(opts.import.concurrency, Some(4));
        assert_eq!(opts.import.business_account_id, 7);
        assert!(opts.import.create_table);
    }

    #[test]
    fn test_import_requires_csv() {
        assert!(Args::try_parse_from(["merchant-import", "import"]).is_err());
    }

    #[test]
    fn test_parse_check() {
        let args = Args::try_parse_from(["merchant-import", "check", "--csv", "a.csv"]).unwrap();
        assert!(matches!(
            args.command,
            Commands::Check(CheckArgs { ref csv, .. }) if csv == &PathBuf::from("a.csv")
        ));
    }
}
