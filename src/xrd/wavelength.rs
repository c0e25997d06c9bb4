//! # 波长标定
//!
//! 由标准样品的 2θ 扫描计算入射束波长。
//!
//! ## 算法概述
//! 1. 检测衍射峰并对每个窗口拟合 Voigt 峰，得到精修后的峰中心
//! 2. 按符号将峰分为直射束左侧（< 0）与右侧（> 0）两组
//! 3. 每组按离直射束由近及远排序，依次与参考表第 k 行配对，取较短长度
//! 4. 由 Bragg 定律 λ = 2·d·sin(θ/2)/n 计算每个峰的波长（θ 为 |2θ| 的弧度值）
//! 5. 输出平均值与总体标准差
//!
//! ## 依赖关系
//! - 被 `commands/calibrate.rs` 调用
//! - 使用 `xrd/detect.rs`、`xrd/fit.rs`
//! - 使用 `models/` 的 Scan, ReferenceTable

use crate::error::{CalibError, Result};
use crate::models::{ReferenceEntry, ReferenceTable, Scan};
use crate::xrd::detect::{self, DetectedPeaks, DetectorConfig};
use crate::xrd::fit::{self, FitConfig, FittedPeak};

use serde::Serialize;

/// 由 Bragg 定律计算波长
///
/// `th` 为散射角 2θ（弧度），`d` 为 d 间距，`n` 为衍射级数。
pub fn lamda_from_bragg(th: f64, d: f64, n: f64) -> f64 {
    2.0 * d * (th / 2.0).sin() / n
}

/// Bragg 定律的逆：给定波长求 2θ（度）
///
/// `λ·n/(2d)` 超出 [-1, 1] 时该反射不存在，返回 `None`。
pub fn two_theta_from_wavelength(lamda: f64, d: f64, n: f64) -> Option<f64> {
    let s = lamda * n / (2.0 * d);
    if !(-1.0..=1.0).contains(&s) {
        return None;
    }
    Some(2.0 * s.asin().to_degrees())
}

/// 峰位于直射束的哪一侧
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    Left,
    Right,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Left => write!(f, "left"),
            Side::Right => write!(f, "right"),
        }
    }
}

/// 一个峰与参考表一行配对得到的波长
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WavelengthSample {
    pub side: Side,
    /// 在该侧的序号（0 为最靠近直射束）
    pub rank: usize,
    /// 拟合峰中心 2θ（度）
    pub center: f64,
    pub d_spacing: f64,
    pub multiplicity: f64,
    pub wavelength: f64,
}

/// 平均值与总体标准差；空集合返回 `None`
pub fn mean_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    Some((mean, var.sqrt()))
}

/// 将峰中心与参考表按位置配对并计算波长
///
/// 右侧峰按升序、左侧峰按绝对值升序，两侧都从参考表第一行开始配对，
/// 超出较短序列的峰或参考行被忽略。恰为 0 的峰不属于任何一侧。
pub fn pair_peaks(centers: &[f64], reference: &ReferenceTable) -> Vec<WavelengthSample> {
    let mut right: Vec<f64> = centers.iter().copied().filter(|&c| c > 0.0).collect();
    let mut left: Vec<f64> = centers.iter().copied().filter(|&c| c < 0.0).collect();
    right.sort_by(|a, b| a.total_cmp(b));
    left.sort_by(|a, b| b.total_cmp(a));

    let mut samples = Vec::new();
    for (side, peaks) in [(Side::Right, right), (Side::Left, left)] {
        for (rank, (center, entry)) in peaks.iter().zip(&reference.entries).enumerate() {
            samples.push(sample(side, rank, *center, entry));
        }
    }
    samples
}

fn sample(side: Side, rank: usize, center: f64, entry: &ReferenceEntry) -> WavelengthSample {
    let th = center.abs().to_radians();
    WavelengthSample {
        side,
        rank,
        center,
        d_spacing: entry.d_spacing,
        multiplicity: entry.multiplicity,
        wavelength: lamda_from_bragg(th, entry.d_spacing, entry.multiplicity),
    }
}

/// 单次扫描的标定结果
#[derive(Debug, Clone)]
pub struct Calibration {
    pub scan_name: String,
    pub detected: DetectedPeaks,
    pub fitted: Vec<FittedPeak>,
    pub samples: Vec<WavelengthSample>,
    /// 平均波长
    pub mean: f64,
    /// 总体标准差
    pub std: f64,
}

impl Calibration {
    /// 未与参考表配对的峰数
    pub fn unpaired(&self) -> usize {
        self.fitted.len().saturating_sub(self.samples.len())
    }

    /// 以平均波长反推每个样本的 2θ 偏差 |2θ| - 2θ_calc（度）
    pub fn residuals(&self) -> Vec<Option<f64>> {
        self.samples
            .iter()
            .map(|s| {
                two_theta_from_wavelength(self.mean, s.d_spacing, s.multiplicity)
                    .map(|calc| s.center.abs() - calc)
            })
            .collect()
    }
}

/// 波长标定器
#[derive(Debug, Clone, Copy, Default)]
pub struct WavelengthCalibrator {
    pub detector: DetectorConfig,
    pub fit: FitConfig,
}

impl WavelengthCalibrator {
    pub fn new(detector: DetectorConfig, fit: FitConfig) -> Self {
        Self { detector, fit }
    }

    /// 检测并拟合所有峰
    pub fn fit_peaks(&self, x: &[f64], y: &[f64]) -> Result<(DetectedPeaks, Vec<FittedPeak>)> {
        let detected = detect::find_peaks(y, &self.detector);

        let fitted = detected
            .windows()
            .map(|w| {
                let right = w.right.min(x.len());
                let left = w.left.min(right);
                fit::fit_voigt(&x[left..right], &y[left..right], w, &self.fit)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((detected, fitted))
    }

    /// 由扫描和参考表计算波长
    pub fn calibrate(&self, scan: &Scan, reference: &ReferenceTable) -> Result<Calibration> {
        let (detected, fitted) = self.fit_peaks(&scan.two_theta, &scan.intensity)?;

        let centers: Vec<f64> = fitted.iter().map(FittedPeak::center).collect();
        let samples = pair_peaks(&centers, reference);

        let wavelengths: Vec<f64> = samples.iter().map(|s| s.wavelength).collect();
        let (mean, std) = mean_std(&wavelengths).ok_or(CalibError::NoWavelengths {
            detected: fitted.len(),
            references: reference.len(),
        })?;

        Ok(Calibration {
            scan_name: scan.name.clone(),
            detected,
            fitted,
            samples,
            mean,
            std,
        })
    }
}
