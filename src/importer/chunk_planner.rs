// ==========================================
// 商户数据导入工具 - 分批规划器
// ==========================================
// 红线: 所有批次拼接后与原记录序列完全一致（不丢、不重）
// ==========================================

use crate::domain::MerchantRecord;
use crate::importer::error::{ImportError, ImportResult};
use std::sync::Arc;

/// 默认每批记录数
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// 一个批次: 记录序列中连续的一段
///
/// 记录本体由 `Arc<[MerchantRecord]>` 共享,批次只持有区间,
/// 分发到工作线程时不复制记录。
#[derive(Debug, Clone)]
pub struct Batch {
    pub index: usize,  // 批次序号（从 0 开始）
    pub offset: usize, // 首条记录在全集中的下标
    records: Arc<[MerchantRecord]>,
    len: usize,
}

impl Batch {
    pub fn records(&self) -> &[MerchantRecord] {
        &self.records[self.offset..self.offset + self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// 按固定大小切分记录
///
/// - 0 条记录 → 0 个批次
/// - 最后一批可以不满
pub fn plan_batches(records: Arc<[MerchantRecord]>, chunk_size: usize) -> ImportResult<Vec<Batch>> {
    if chunk_size == 0 {
        return Err(ImportError::ConfigValueError {
            key: "import.chunk_size".to_string(),
            message: "必须大于 0".to_string(),
        });
    }

    let total = records.len();
    let batches = (0..total)
        .step_by(chunk_size)
        .enumerate()
        .map(|(index, offset)| Batch {
            index,
            offset,
            records: Arc::clone(&records),
            len: chunk_size.min(total - offset),
        })
        .collect();

    Ok(batches)
}
