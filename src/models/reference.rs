//! # 标准样品参考表
//!
//! 标准样品（如 LaB6）的 d 间距及对应的衍射级数，按由大到小排列，
//! 与离直射束由近及远的衍射峰一一对应。
//!
//! ## 依赖关系
//! - 被 `parsers/reference.rs` 构造
//! - 被 `xrd/wavelength.rs` 使用

use serde::{Deserialize, Serialize};

/// 参考表中的一行
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    /// d 间距（Å）
    pub d_spacing: f64,
    /// 衍射级数 n
    pub multiplicity: f64,
}

/// 参考表
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceTable {
    pub entries: Vec<ReferenceEntry>,
}

impl ReferenceTable {
    /// 由 d 间距与级数两个序列构造，取较短者的长度
    pub fn from_columns(d_spacings: &[f64], multiplicities: &[f64]) -> Self {
        let entries = d_spacings
            .iter()
            .zip(multiplicities)
            .map(|(&d_spacing, &multiplicity)| ReferenceEntry {
                d_spacing,
                multiplicity,
            })
            .collect();
        ReferenceTable { entries }
    }

    /// 将所有级数置为 1
    pub fn with_unit_order(mut self) -> Self {
        for entry in &mut self.entries {
            entry.multiplicity = 1.0;
        }
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_columns_truncates() {
        let table = ReferenceTable::from_columns(&[2.0, 1.5, 1.2], &[1.0, 2.0]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.entries[1].multiplicity, 2.0);
    }

    #[test]
    fn test_unit_order() {
        let table = ReferenceTable::from_columns(&[2.0, 1.5], &[3.0, 2.0]).with_unit_order();
        assert!(table.entries.iter().all(|e| e.multiplicity == 1.0));
    }
}
