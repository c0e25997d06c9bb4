//! # d 间距参考表解析器
//!
//! ## 格式说明
//! ```text
//! LaB6 d-spacings      <- 表头（默认 3 行）
//! ...
//! ...
//! 4.156   1
//! 2.939   1
//! 2.399
//! ```
//! 第一列为 d 间距，第二列（可选）为衍射级数，缺省为 1；其余列忽略。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 使用
//! - 使用 `models/reference.rs`

use super::{read_text, split_fields};
use crate::error::{CalibError, Result};
use crate::models::ReferenceTable;
use std::path::Path;

/// 默认跳过的表头行数
pub const DEFAULT_HEADER_LINES: usize = 3;

/// 解析参考表文件
pub fn parse_reference_file(path: &Path, skip_rows: usize) -> Result<ReferenceTable> {
    let content = read_text(path)?;
    parse_reference_content(&content, skip_rows).map_err(|reason| CalibError::ParseError {
        format: "reference".to_string(),
        path: path.display().to_string(),
        reason,
    })
}

/// 从字符串内容解析参考表
pub fn parse_reference_content(
    content: &str,
    skip_rows: usize,
) -> std::result::Result<ReferenceTable, String> {
    let mut d_spacings = Vec::new();
    let mut multiplicities = Vec::new();

    for (lineno, line) in content.lines().enumerate().skip(skip_rows) {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let values = split_fields(line)
            .map(|s| s.parse::<f64>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| format!("line {}: {}", lineno + 1, e))?;

        let Some(&d_spacing) = values.first() else {
            continue;
        };
        if !(d_spacing.is_finite() && d_spacing > 0.0) {
            return Err(format!(
                "line {}: d-spacing must be positive, got {}",
                lineno + 1,
                d_spacing
            ));
        }
        let multiplicity = values.get(1).copied().unwrap_or(1.0);
        if !(multiplicity.is_finite() && multiplicity > 0.0) {
            return Err(format!(
                "line {}: multiplicity must be positive, got {}",
                lineno + 1,
                multiplicity
            ));
        }
        d_spacings.push(d_spacing);
        multiplicities.push(multiplicity);
    }

    Ok(ReferenceTable::from_columns(&d_spacings, &multiplicities))
}
