//! # 批量处理模块
//!
//! 收集数据目录中的扫描文件并逐个标定。
//!
//! ## 功能
//! - 自动检测输入类型（文件/目录）
//! - 按扩展名模式收集文件
//! - 并行处理，结果保持文件顺序
//! - 进度反馈与统计
//!
//! ## 依赖关系
//! - 被 `commands/calibrate.rs` 使用
//! - 使用 `rayon` 进行并行处理
//! - 使用 `indicatif` 显示进度

pub mod collector;
pub mod runner;

pub use collector::FileCollector;
pub use runner::{BatchResult, BatchRunner, ProcessResult};
