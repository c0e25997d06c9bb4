//! # calibrate 子命令 CLI 定义
//!
//! 由标准样品（如 LaB6）的 2θ 扫描标定入射束波长。
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/calibrate.rs`

use crate::parsers::reference::DEFAULT_HEADER_LINES;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 图表输出格式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum PlotFormat {
    /// PNG image
    #[default]
    Png,
    /// SVG vector image
    Svg,
}

impl PlotFormat {
    pub fn extension(self) -> &'static str {
        match self {
            PlotFormat::Png => "png",
            PlotFormat::Svg => "svg",
        }
    }
}

/// calibrate 子命令参数
#[derive(Args, Debug)]
pub struct CalibrateArgs {
    /// Input: a .chi scan file or a directory containing scans
    pub input: PathBuf,

    /// Reference table of d-spacings (and optional multiplicities)
    #[arg(short, long)]
    pub reference: PathBuf,

    /// Header lines to skip in the reference table
    #[arg(long, default_value_t = DEFAULT_HEADER_LINES)]
    pub skip_rows: usize,

    /// Treat every reflection as first order (ignore the multiplicity column)
    #[arg(long, default_value_t = false)]
    pub unit_order: bool,

    // ─────────────────────────────────────────────────────────────
    // 峰检测与拟合参数
    // ─────────────────────────────────────────────────────────────
    /// Half-width of the peak window in samples
    #[arg(long, default_value_t = 3)]
    pub sides: usize,

    /// Minimum peak height
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub threshold: f64,

    /// Number of neighbours on each side a local maximum must exceed
    #[arg(long, default_value_t = 5)]
    pub order: usize,

    /// Maximum Levenberg-Marquardt iterations per peak
    #[arg(long, default_value_t = 200)]
    pub max_iterations: usize,

    // ─────────────────────────────────────────────────────────────
    // 输出参数
    // ─────────────────────────────────────────────────────────────
    /// Plot each scan with detected peaks and fitted centers
    #[arg(long, default_value_t = false)]
    pub plot: bool,

    /// Plot image format
    #[arg(long, value_enum, default_value = "png")]
    pub plot_format: PlotFormat,

    /// Directory for plot images
    #[arg(long, default_value = "calibration_plots")]
    pub plot_dir: PathBuf,

    /// Figure width in pixels (for PNG) or points (for SVG)
    #[arg(long, default_value_t = 1200)]
    pub width: u32,

    /// Figure height in pixels (for PNG) or points (for SVG)
    #[arg(long, default_value_t = 800)]
    pub height: u32,

    /// Write per-scan wavelength summary to this CSV file
    #[arg(long)]
    pub output_csv: Option<PathBuf>,

    /// Write per-peak wavelength samples to this CSV file
    #[arg(long)]
    pub peaks_csv: Option<PathBuf>,

    // ─────────────────────────────────────────────────────────────
    // 批量处理参数
    // ─────────────────────────────────────────────────────────────
    /// Glob pattern for scan files (directory mode, e.g., "*.chi,*.xy")
    #[arg(long, default_value = "*.chi")]
    pub pattern: String,

    /// Number of parallel jobs (0 = auto, directory mode only)
    #[arg(short, long, default_value_t = 0)]
    pub jobs: usize,

    /// Recurse into subdirectories
    #[arg(long, default_value_t = false)]
    pub recursive: bool,
}
