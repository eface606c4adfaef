// ==========================================
// 商户数据导入工具 - 单行解析器
// ==========================================
// csv格式: `phone,balance,expired_at`
// 时间格式: `2018-08-17 15:05:46`
// 职责: 单行 → MerchantRecord 或 ValidationError（纯函数,无副作用）
// ==========================================

use crate::domain::{MerchantRecord, EXPIRED_AT_FORMAT};
use crate::importer::error::ValidationError;
use chrono::{NaiveDateTime, Timelike};

/// 行最小字节数（含行尾）,用于拦截空行/空白行
pub const MIN_LINE_BYTES: usize = 6;

/// 每行字段数
pub const FIELD_COUNT: usize = 3;

/// expired_at 字段定长（YYYY-MM-DD HH:MM:SS）
const EXPIRED_AT_LEN: usize = 19;

/// 原始行（校验期间临时存在）
#[derive(Debug, Clone, Copy)]
pub struct RawLine<'a> {
    pub number: usize, // 行号（从 1 开始）
    pub text: &'a str, // 原始内容（含行尾）
}

/// 单行解析器
///
/// business_account_id 不来自文件,由调用方指定后写入每条记录。
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordParser {
    business_account_id: i32,
}

impl RecordParser {
    pub fn new(business_account_id: i32) -> Self {
        Self {
            business_account_id,
        }
    }

    /// 解析一行
    ///
    /// # 规则（按顺序）
    /// 1. 行长度 < MIN_LINE_BYTES → 缺少字段
    /// 2. 去除 \r \n 后按 `,` 切分,字段数必须为 3
    /// 3. phone: 十进制 i64
    /// 4. balance: 十进制 i32
    /// 5. expired_at: YYYY-MM-DD HH:MM:SS
    pub fn parse(&self, raw: RawLine<'_>) -> Result<MerchantRecord, ValidationError> {
        let line = raw.number;

        if raw.text.len() < MIN_LINE_BYTES {
            return Err(ValidationError::MissingFields {
                line,
                value: raw.text.to_string(),
            });
        }

        let content = raw.text.trim_end_matches(['\n', '\r']);
        let fields: Vec<&str> = content.split(',').collect();
        if fields.len() != FIELD_COUNT {
            return Err(ValidationError::WrongFieldCount {
                line,
                found: fields.len(),
                value: content.to_string(),
            });
        }

        let mobile_phone = fields[0]
            .parse::<i64>()
            .map_err(|_| ValidationError::InvalidPhone {
                line,
                value: fields[0].to_string(),
            })?;

        let balance = fields[1]
            .parse::<i32>()
            .map_err(|_| ValidationError::InvalidBalance {
                line,
                value: fields[1].to_string(),
            })?;

        let expired_at = fields[2];
        if !is_valid_expired_at(expired_at) {
            return Err(ValidationError::InvalidExpiry {
                line,
                value: expired_at.to_string(),
            });
        }

        Ok(MerchantRecord::unbound(
            self.business_account_id,
            mobile_phone,
            balance,
            expired_at,
        ))
    }
}

/// expired_at 各位置的分隔符,其余位置必须是数字
const EXPIRED_AT_SEPARATORS: [(usize, u8); 5] =
    [(4, b'-'), (7, b'-'), (10, b' '), (13, b':'), (16, b':')];

/// 逐字节版式校验 + chrono 日历校验
///
/// chrono 会跳过数字前的空格并接受 `:60` 闰秒,因此先按字节固定版式。
fn is_valid_expired_at(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != EXPIRED_AT_LEN {
        return false;
    }

    let layout_ok = bytes.iter().enumerate().all(|(i, b)| {
        match EXPIRED_AT_SEPARATORS.iter().find(|(pos, _)| *pos == i) {
            Some((_, sep)) => b == sep,
            None => b.is_ascii_digit(),
        }
    });
    if !layout_ok {
        return false;
    }

    NaiveDateTime::parse_from_str(value, EXPIRED_AT_FORMAT)
        .map(|dt| dt.nanosecond() < 1_000_000_000)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MerchantStatus;

    fn parse(text: &str) -> Result<MerchantRecord, ValidationError> {
        RecordParser::new(7).parse(RawLine { number: 4, text })
    }

    #[test]
    fn test_parse_valid_line() {
        let record = parse("13800000000,100,2020-01-01 10:00:00\n").unwrap();

        assert_eq!(record.business_account_id, 7);
        assert_eq!(record.mobile_phone, 13800000000);
        assert_eq!(record.balance, 100);
        assert_eq!(record.expired_at, "2020-01-01 10:00:00");
        assert_eq!(record.status, MerchantStatus::Unbound);
    }

    #[test]
    fn test_parse_strips_crlf_and_last_line_without_newline() {
        assert!(parse("13800000000,-5,2020-01-01 10:00:00\r\n").is_ok());
        assert!(parse("13800000000,0,2020-01-01 10:00:00").is_ok());
    }

    #[test]
    fn test_short_line_is_missing_fields() {
        for text in ["\n", "\r\n", "    \n", "1,2\n"] {
            let err = parse(text).unwrap_err();
            assert!(
                matches!(err, ValidationError::MissingFields { line: 4, .. }),
                "{:?} 应判定为缺少字段",
                text
            );
        }
    }

    #[test]
    fn test_wrong_field_count() {
        let err = parse("13800000000,100\n").unwrap_err();
        assert!(matches!(err, ValidationError::WrongFieldCount { found: 2, .. }));

        let err = parse("13800000000,100,2020-01-01 10:00:00,extra\n").unwrap_err();
        assert!(matches!(err, ValidationError::WrongFieldCount { found: 4, .. }));
    }

    #[test]
    fn test_invalid_phone() {
        let err = parse("abc,100,2020-01-01 10:00:00\n").unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidPhone {
                line: 4,
                value: "abc".to_string()
            }
        );
        assert_eq!(err.reason(), "invalid phone");
    }

    #[test]
    fn test_invalid_balance_is_rejected() {
        let err = parse("13800000000,1x0,2020-01-01 10:00:00\n").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidBalance { .. }));

        // 超出 i32 范围
        let err = parse("13800000000,3000000000,2020-01-01 10:00:00\n").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidBalance { .. }));
    }

    #[test]
    fn test_invalid_expiry() {
        for value in [
            "2020-13-01 10:00:00",
            "2020-01-01",
            "2020-1-1 10:00:00",
            "2020/01/01 10:00:00",
            "2020-01-01T10:00:00",
            "2020-01-01 10:00:60",
            "2020-01-01 23:59:60",
            "2020-01-01  1:00:00",
            "2020-01-01 10: 0:00",
            "2020- 1-01 10:00:00",
            "2020-02-30 10:00:00",
            "+020-01-01 10:00:00",
        ] {
            let line = format!("13800000000,100,{}\n", value);
            let err = parse(&line).unwrap_err();
            assert_eq!(err.value(), value);
            assert!(matches!(err, ValidationError::InvalidExpiry { .. }));
        }
    }

    #[test]
    fn test_expiry_boundaries_accepted() {
        for value in ["2020-02-29 00:00:00", "1999-12-31 23:59:59"] {
            assert!(is_valid_expired_at(value), "{} 应通过", value);
        }
    }

    #[test]
    fn test_fields_are_not_trimmed() {
        let err = parse(" 13800000000,100,2020-01-01 10:00:00\n").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPhone { .. }));
    }
}
