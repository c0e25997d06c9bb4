//! # 统一错误处理模块
//!
//! 定义 xpdcal 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// xpdcal 统一错误类型
#[derive(Error, Debug)]
pub enum CalibError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    // ─────────────────────────────────────────────────────────────
    // 拟合错误
    // ─────────────────────────────────────────────────────────────
    #[error("Peak window [{left}, {right}) has {len} points, need at least {needed} to fit")]
    WindowTooSmall {
        left: usize,
        right: usize,
        len: usize,
        needed: usize,
    },

    #[error("Singular normal matrix while fitting peak near {center:.4}")]
    SingularMatrix { center: f64 },

    #[error("Fit did not converge after {iterations} iterations (peak near {center:.4})")]
    NotConverged { iterations: usize, center: f64 },

    #[error("Fit produced non-finite parameters (peak near {center:.4})")]
    NonFinite { center: f64 },

    // ─────────────────────────────────────────────────────────────
    // 标定错误
    // ─────────────────────────────────────────────────────────────
    #[error("No wavelength could be computed: {detected} peaks detected, {references} reference reflections")]
    NoWavelengths { detected: usize, references: usize },

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown operating mode '{0}' (expected 0/beamline, 1/test or 2/simulation)")]
    InvalidMode(String),

    // ─────────────────────────────────────────────────────────────
    // 输出错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Plot error: {0}")]
    PlotError(String),

    // ─────────────────────────────────────────────────────────────
    // 数据流
    // ─────────────────────────────────────────────────────────────
    #[error("Every sink subscribed to '{0}' is disconnected")]
    SinkDisconnected(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, CalibError>;
