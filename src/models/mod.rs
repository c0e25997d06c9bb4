//! # 数据模型模块
//!
//! 定义扫描数据和标准样品参考表的数据模型。
//!
//! ## 依赖关系
//! - 被 `parsers/`、`xrd/` 和 `commands/` 使用
//! - 子模块: scan, reference

pub mod reference;
pub mod scan;

pub use reference::{ReferenceEntry, ReferenceTable};
pub use scan::Scan;
