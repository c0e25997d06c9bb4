//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `calibrate`: 由标准样品扫描标定波长
//! - `setup`: 装配分析环境并可回放扫描
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: calibrate, setup

pub mod calibrate;
pub mod setup;

use clap::{Parser, Subcommand};

/// xpdcal - 衍射标准样品波长标定工具
#[derive(Parser)]
#[command(name = "xpdcal")]
#[command(author = "Changjiang Wu")]
#[command(version)]
#[command(about = "Beam wavelength calibration from two-theta scans of a diffraction standard", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Estimate the beam wavelength from .chi scans of a standard
    Calibrate(calibrate::CalibrateArgs),

    /// Wire the analysis environment and optionally replay a scan through it
    Setup(setup::SetupArgs),
}
