// ==========================================
// 商户数据导入工具 - 控制台进度
// ==========================================

use crate::importer::{ImportEvent, ImportEventListener};
use std::sync::atomic::{AtomicUsize, Ordering};

/// 将导入事件打印到 stdout
#[derive(Debug, Default)]
pub struct ConsoleProgress {
    total_batches: AtomicUsize,
    staged_batches: AtomicUsize,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn line(&self, event: &ImportEvent) -> String {
        match event {
            ImportEvent::Validated { rows } => format!("格式检查通过, 共 {} 行记录", rows),
            ImportEvent::Planned {
                batches,
                concurrency,
            } => {
                self.total_batches.store(*batches, Ordering::Relaxed);
                format!("共 {} 个批次, 并发 {}", batches, concurrency)
            }
            ImportEvent::BatchStaged { index, rows } => {
                let done = self.staged_batches.fetch_add(1, Ordering::Relaxed) + 1;
                format!(
                    "批次 {} 已写入 {} 行 ({}/{})",
                    index,
                    rows,
                    done,
                    self.total_batches.load(Ordering::Relaxed)
                )
            }
            ImportEvent::BatchFailed { index, reason } => {
                format!("批次 {} 失败: {}", index, reason)
            }
        }
    }
}

impl ImportEventListener for ConsoleProgress {
    fn on_event(&self, event: ImportEvent) {
        println!("{}", self.line(&event));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_counts_staged_batches() {
        let progress = ConsoleProgress::new();
        progress.line(&ImportEvent::Planned {
            batches: 3,
            concurrency: 2,
        });
        progress.line(&ImportEvent::BatchStaged { index: 1, rows: 10 });
        let second = progress.line(&ImportEvent::BatchStaged { index: 0, rows: 10 });

        assert_eq!(second, "批次 0 已写入 10 行 (2/3)");
    }
}
