//! # 解析器模块
//!
//! 读取 2θ 扫描文件和标准样品 d 间距参考表。
//!
//! ## 依赖关系
//! - 被 `commands/` 模块使用
//! - 使用 `models/` 数据模型
//! - 子模块: chi, reference

pub mod chi;
pub mod reference;

use crate::error::{CalibError, Result};
use std::fs;
use std::path::Path;

pub use chi::parse_chi_file;
pub use reference::parse_reference_file;

/// 读取整个文本文件
pub(crate) fn read_text(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(CalibError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    fs::read_to_string(path).map_err(|e| CalibError::FileReadError {
        path: path.display().to_string(),
        source: e,
    })
}

/// 按空白或逗号切分一行数值
pub(crate) fn split_fields(line: &str) -> impl Iterator<Item = &str> {
    line.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
}
