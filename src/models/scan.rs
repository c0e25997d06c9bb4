//! # 2θ 扫描数据模型
//!
//! 一次扫描由等长的角度序列与强度序列组成。
//!
//! ## 依赖关系
//! - 被 `parsers/chi.rs` 构造
//! - 被 `xrd/` 和 `commands/calibrate.rs` 使用

use crate::error::{CalibError, Result};
use serde::{Deserialize, Serialize};

/// 2θ 扫描（角度，强度）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scan {
    /// 扫描名称（通常为文件名去掉扩展名）
    pub name: String,
    /// 2θ 角度（度），中心为直射束
    pub two_theta: Vec<f64>,
    /// 探测器强度
    pub intensity: Vec<f64>,
}

impl Scan {
    /// 由两列数据构造，长度必须一致
    pub fn new(name: impl Into<String>, two_theta: Vec<f64>, intensity: Vec<f64>) -> Result<Self> {
        if two_theta.len() != intensity.len() {
            return Err(CalibError::InvalidArgument(format!(
                "angle and intensity columns differ in length ({} vs {})",
                two_theta.len(),
                intensity.len()
            )));
        }
        Ok(Scan {
            name: name.into(),
            two_theta,
            intensity,
        })
    }

    pub fn len(&self) -> usize {
        self.two_theta.len()
    }

    pub fn is_empty(&self) -> bool {
        self.two_theta.is_empty()
    }

    /// 角度范围 (min, max)
    pub fn angle_range(&self) -> Option<(f64, f64)> {
        if self.is_empty() {
            return None;
        }
        let min = self.two_theta.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self
            .two_theta
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        Some((min, max))
    }

    /// 最大强度
    pub fn max_intensity(&self) -> f64 {
        self.intensity.iter().copied().fold(0.0_f64, f64::max)
    }
}
