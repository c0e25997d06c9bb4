//! # XRD 波长标定模块
//!
//! 由标准样品衍射扫描确定入射束波长。
//!
//! ## 子模块
//! - `detect`: 衍射峰检测
//! - `voigt`: Voigt 线型
//! - `fit`: Levenberg–Marquardt 峰拟合
//! - `wavelength`: 峰配对、Bragg 定律与统计
//! - `plot`: 图表生成
//! - `export`: 数据导出
//!
//! ## 依赖关系
//! - 被 `commands/calibrate.rs` 使用
//! - 使用 `models/` 的 Scan, ReferenceTable

pub mod detect;
pub mod export;
pub mod fit;
pub mod plot;
pub mod voigt;
pub mod wavelength;

pub use detect::DetectorConfig;
pub use fit::FitConfig;
pub use wavelength::{Calibration, WavelengthCalibrator};
