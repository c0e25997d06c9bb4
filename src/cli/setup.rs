//! # setup 子命令 CLI 定义
//!
//! 运行模式与配置根目录可由环境变量提供。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/setup.rs`

use crate::pipeline::config::MODE_ENV;
use crate::pipeline::Mode;
use clap::Args;
use std::path::PathBuf;

/// setup 子命令参数
#[derive(Args, Debug)]
pub struct SetupArgs {
    /// Operating mode: beamline (0), test (1) or simulation (2)
    #[arg(long, value_enum, env = MODE_ENV, default_value = "beamline")]
    pub mode: Mode,

    /// Configuration base directory (default depends on the mode)
    #[arg(long, env = "XPDAN_CONFIG_BASE")]
    pub config_base: Option<PathBuf>,

    /// Name of the experiment database
    #[arg(long, default_value = "xpd")]
    pub db: String,

    /// Name of the data source to subscribe to
    #[arg(long, default_value = "d")]
    pub source: String,

    /// Name of the sink receiving forwarded records
    #[arg(long, default_value = "raw_source")]
    pub sink: String,

    /// Replay a .chi scan through the source -> sink forwarding
    #[arg(long)]
    pub replay: Option<PathBuf>,
}
