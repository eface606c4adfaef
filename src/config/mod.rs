// ==========================================
// 商户数据导入工具 - 配置层
// ==========================================
// 职责: 加载 JSON 配置文件,提供数据库与导入参数
// 优先级: 命令行 > 配置文件 > 默认值
// ==========================================

pub mod app_config;

pub use app_config::{
    default_config_path, ApplicationOptions, ConfigError, DatabaseOptions, ImportOptions,
    CONFIG_ENV_VAR,
};
