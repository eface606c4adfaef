// ==========================================
// 商户数据导入工具 - 文件校验器
// ==========================================
// 职责: 逐行检查+读取 csv 文件
// 红线: 任意一行格式错误即终止,不返回部分记录
// ==========================================

use crate::domain::MerchantRecord;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::record_parser::{RawLine, RecordParser};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, error, info, instrument};

/// 校验通过的文件内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFile {
    pub records: Vec<MerchantRecord>, // 按文件顺序
    pub total_lines: usize,           // 处理的行数（== records.len()）
}

/// 文件校验器
#[derive(Debug, Clone, Copy, Default)]
pub struct FileValidator {
    parser: RecordParser,
}

impl FileValidator {
    pub fn new(parser: RecordParser) -> Self {
        Self { parser }
    }

    /// 打开并校验整个文件
    ///
    /// # 返回
    /// - Ok(ValidatedFile): 每一行都生成了一条记录
    /// - Err(FileOpen): 文件打开失败
    /// - Err(FileRead): 读取中途 I/O 错误（携带已读取行数）
    /// - Err(Validation): 第一条格式错误
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn validate_file<P: AsRef<Path>>(&self, path: P) -> ImportResult<ValidatedFile> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| {
            error!(error = %source, "文件打开失败");
            ImportError::FileOpen {
                path: path.display().to_string(),
                source,
            }
        })?;

        let validated = self
            .validate_reader(BufReader::new(file))
            .map_err(|e| match e {
                ReadFailure::Io { line, source } => ImportError::FileRead {
                    path: path.display().to_string(),
                    line,
                    source,
                },
                ReadFailure::Invalid(v) => ImportError::Validation(v),
            })?;

        info!(lines = validated.total_lines, "文件格式全部检查正确");
        Ok(validated)
    }

    /// 从任意 BufRead 校验（文件句柄由调用方持有,随作用域释放）
    pub fn validate_reader<R: BufRead>(&self, mut reader: R) -> Result<ValidatedFile, ReadFailure> {
        let mut records = Vec::new();
        let mut line_number = 0usize;
        let mut buf = String::new();

        loop {
            buf.clear();
            let read = reader.read_line(&mut buf).map_err(|source| {
                error!(line = line_number, error = %source, "文件读取失败");
                ReadFailure::Io {
                    line: line_number,
                    source,
                }
            })?;

            // EOF 处的零长度片段不算一行
            if read == 0 {
                break;
            }

            line_number += 1;
            let raw = RawLine {
                number: line_number,
                text: &buf,
            };

            match self.parser.parse(raw) {
                Ok(record) => records.push(record),
                Err(e) => {
                    error!(line = line_number, raw = %buf.trim_end(), error = %e, "行格式错误");
                    return Err(ReadFailure::Invalid(e));
                }
            }
        }

        debug!(lines = line_number, "读取完成");
        Ok(ValidatedFile {
            total_lines: line_number,
            records,
        })
    }
}

/// 读取层失败（尚未关联文件路径）
#[derive(Debug)]
pub enum ReadFailure {
    Io { line: usize, source: std::io::Error },
    Invalid(crate::importer::error::ValidationError),
}
