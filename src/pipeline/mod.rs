//! # 分析环境装配
//!
//! 替代全局状态：显式的配置对象与从数据源到下游的单向转发通道。
//!
//! ## 子模块
//! - `config`: 运行模式与分析配置
//! - `stream`: 数据文档、数据源与接收端
//!
//! ## 依赖关系
//! - 被 `commands/setup.rs` 使用
//! - 使用 `models/scan.rs` 回放扫描

pub mod config;
pub mod stream;

pub use config::{AnalysisConfig, Mode};
pub use stream::{DataSource, Sink};
