//! # 命令执行模块
//!
//! 实现各子命令的业务逻辑。
//!
//! ## 依赖关系
//! - 被 `main.rs` 调用
//! - 使用 `cli/`, `parsers/`, `xrd/`, `pipeline/`, `utils/`
//! - 子模块: calibrate, setup

pub mod calibrate;
pub mod setup;

use crate::cli::Commands;
use crate::error::Result;

/// 执行命令
pub fn run(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Calibrate(args) => calibrate::execute(args),
        Commands::Setup(args) => setup::execute(args),
    }
}
