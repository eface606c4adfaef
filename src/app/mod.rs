// ==========================================
// 商户数据导入工具 - 应用层
// ==========================================
// 职责: 命令行集成,连接用户与导入流程
// ==========================================

pub mod cli;
pub mod commands;
pub mod progress;

// 重导出
pub use cli::{Args, CheckArgs, Commands, ImportArgs};
pub use commands::{run, EXIT_CONFIG_ERROR, EXIT_INPUT_ERROR, EXIT_SUCCESS};
pub use progress::ConsoleProgress;
