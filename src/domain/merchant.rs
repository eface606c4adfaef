// ==========================================
// 商户数据导入工具 - 商户导入记录
// ==========================================
// 对齐: merchant_svc_to_imports 表
// 用途: 校验层生成,导入层只读
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 目标表名
pub const MERCHANT_IMPORT_TABLE: &str = "merchant_svc_to_imports";

/// expired_at 字段的时间格式（例: 2018-08-17 15:05:46）
pub const EXPIRED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// 导入后使用状态
// ==========================================
// 序列化格式: 整数（与数据库一致）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i32", try_from = "i32")]
pub enum MerchantStatus {
    #[default]
    Unbound, // 未绑定（导入时固定）
    Bound,   // 已绑定
}

impl MerchantStatus {
    /// 数据库存储值
    pub fn as_db_value(self) -> i32 {
        match self {
            MerchantStatus::Unbound => 0,
            MerchantStatus::Bound => 1,
        }
    }
}

impl From<MerchantStatus> for i32 {
    fn from(status: MerchantStatus) -> Self {
        status.as_db_value()
    }
}

impl TryFrom<i32> for MerchantStatus {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MerchantStatus::Unbound),
            1 => Ok(MerchantStatus::Bound),
            other => Err(format!("未知的商户状态值: {}", other)),
        }
    }
}

impl fmt::Display for MerchantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MerchantStatus::Unbound => write!(f, "UNBOUND"),
            MerchantStatus::Bound => write!(f, "BOUND"),
        }
    }
}

// ==========================================
// MerchantRecord - 已校验的商户导入记录
// ==========================================
// 红线: 只有三个字段全部通过校验的行才能生成 MerchantRecord
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantRecord {
    pub business_account_id: i32, // 商户账户（由调用方指定）
    pub mobile_phone: i64,        // 手机号
    pub balance: i32,             // 余额
    pub expired_at: String,       // 过期时间（已校验格式,按文本存储）
    pub status: MerchantStatus,   // 使用状态（导入时固定 Unbound）
}

impl MerchantRecord {
    /// 创建导入记录,状态固定为 Unbound
    pub fn unbound(
        business_account_id: i32,
        mobile_phone: i64,
        balance: i32,
        expired_at: impl Into<String>,
    ) -> Self {
        Self {
            business_account_id,
            mobile_phone,
            balance,
            expired_at: expired_at.into(),
            status: MerchantStatus::Unbound,
        }
    }
}
