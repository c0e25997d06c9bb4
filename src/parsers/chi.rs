//! # .chi 扫描文件解析器
//!
//! 解析积分后的一维衍射数据（两列：2θ，强度）。
//!
//! ## 格式说明
//! ```text
//! -20.000  12.5
//! -19.980  12.7
//! ...
//! ```
//! 列之间可用空白或逗号分隔；以 `#` 开头或首字段非数值的行视为注释。
//! 多于两列时仅使用前两列。
//!
//! ## 依赖关系
//! - 被 `parsers/mod.rs` 使用
//! - 使用 `models/scan.rs`

use super::{read_text, split_fields};
use crate::error::{CalibError, Result};
use crate::models::Scan;
use std::path::Path;

/// 解析 .chi 文件
pub fn parse_chi_file(path: &Path) -> Result<Scan> {
    let content = read_text(path)?;
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");

    parse_chi_content(&content, name).map_err(|reason| CalibError::ParseError {
        format: "chi".to_string(),
        path: path.display().to_string(),
        reason,
    })
}

/// 从字符串内容解析两列数据
pub fn parse_chi_content(content: &str, name: &str) -> std::result::Result<Scan, String> {
    let mut two_theta = Vec::new();
    let mut intensity = Vec::new();

    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut fields = split_fields(line);
        let first = match fields.next().map(str::parse::<f64>) {
            Some(Ok(v)) => v,
            // 非数值首字段：表头或注释
            _ => continue,
        };
        let second = fields
            .next()
            .ok_or_else(|| format!("line {}: expected two columns", lineno + 1))?
            .parse::<f64>()
            .map_err(|e| format!("line {}: invalid intensity: {}", lineno + 1, e))?;

        two_theta.push(first);
        intensity.push(second);
    }

    Scan::new(name, two_theta, intensity).map_err(|e| e.to_string())
}
