// ==========================================
// 商户数据导入工具 - 导入结果
// ==========================================
// 红线: 每个导入任务只产生一个 ImportOutcome
// ==========================================

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// 失败类别（决定提示文案与退出码）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    Input,     // 文件读取/格式错误,数据库未被触碰
    Database,  // 格式正确,写入数据库失败
    Cancelled, // 用户取消,事务已回滚
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Input => write!(f, "INPUT"),
            FailureKind::Database => write!(f, "DATABASE"),
            FailureKind::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// 导入任务的最终结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ImportOutcome {
    Succeeded {
        rows: usize,
        batches: usize,
        elapsed: Duration,
    },
    Failed {
        kind: FailureKind,
        reason: String,
        rows_read: usize,
        elapsed: Duration,
    },
}

impl ImportOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ImportOutcome::Succeeded { .. })
    }

    pub fn elapsed(&self) -> Duration {
        match self {
            ImportOutcome::Succeeded { elapsed, .. } | ImportOutcome::Failed { elapsed, .. } => {
                *elapsed
            }
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            ImportOutcome::Succeeded { .. } => None,
            ImportOutcome::Failed { kind, .. } => Some(*kind),
        }
    }

    /// 进程退出码: 0 成功, 1 数据库失败/取消, 2 输入错误
    pub fn exit_code(&self) -> u8 {
        match self.failure_kind() {
            None => 0,
            Some(FailureKind::Database) | Some(FailureKind::Cancelled) => 1,
            Some(FailureKind::Input) => 2,
        }
    }
}

impl fmt::Display for ImportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportOutcome::Succeeded { rows, elapsed, .. } => write!(
                f,
                "共成功导入 {} 行记录, 用时 {} 毫秒",
                rows,
                elapsed.as_millis()
            ),
            ImportOutcome::Failed {
                kind: FailureKind::Input,
                reason,
                ..
            } => write!(f, "请检查csv数据格式, 数据库未做任何改动: {}", reason),
            ImportOutcome::Failed {
                kind: FailureKind::Database,
                reason,
                rows_read,
                elapsed,
            } => write!(
                f,
                "类型检查正确, 导入数据库失败. 共有 {} 行记录, 用时 {} 毫秒: {}",
                rows_read,
                elapsed.as_millis(),
                reason
            ),
            ImportOutcome::Failed {
                kind: FailureKind::Cancelled,
                rows_read,
                elapsed,
                ..
            } => write!(
                f,
                "导入已取消, 事务已回滚. 共有 {} 行记录, 用时 {} 毫秒",
                rows_read,
                elapsed.as_millis()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_follows_outcome() {
        let ok = ImportOutcome::Succeeded {
            rows: 3,
            batches: 1,
            elapsed: Duration::from_millis(5),
        };
        let input = ImportOutcome::Failed {
            kind: FailureKind::Input,
            reason: "invalid phone".to_string(),
            rows_read: 0,
            elapsed: Duration::ZERO,
        };
        let db = ImportOutcome::Failed {
            kind: FailureKind::Database,
            reason: "commit failed".to_string(),
            rows_read: 3,
            elapsed: Duration::ZERO,
        };

        assert_eq!(ok.exit_code(), 0);
        assert_eq!(input.exit_code(), 2);
        assert_eq!(db.exit_code(), 1);
        assert!(ok.to_string().contains("共成功导入 3 行记录"));
        assert!(input.to_string().contains("数据库未做任何改动"));
        assert!(db.to_string().contains("导入数据库失败"));
    }
}
