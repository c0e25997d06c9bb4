//! # xpdcal - 衍射标准样品波长标定工具
//!
//! 由标准样品（如 LaB6）的 2θ 扫描确定入射束波长，并提供分析环境的装配。
//!
//! ## 子命令
//! - `calibrate` - 峰检测、Voigt 拟合、Bragg 定律求波长
//! - `setup`     - 运行模式、配置对象与数据转发
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── parsers/   (扫描与参考表解析)
//!   │     ├── xrd/       (峰检测、拟合、波长)
//!   │     ├── pipeline/  (配置与数据流)
//!   │     ├── batch/     (批量处理)
//!   │     └── models/    (数据模型)
//!   ├── utils/      (工具函数)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod cli;
mod commands;
mod error;
mod models;
mod parsers;
mod pipeline;
mod utils;
mod xrd;

use clap::Parser;
use cli::Cli;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
