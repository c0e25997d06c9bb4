//! # Voigt 线型
//!
//! Gaussian 与 Lorentzian 卷积得到的峰形，用于拟合衍射峰。
//!
//! ## 公式
//! V(x) = A · Re[w(z)] / (σ √(2π)),  z = (x - c + iγ) / (σ √2)
//!
//! 其中 w(z) 为 Faddeeva 函数。拟合时取 γ = σ，只有 A, c, σ 三个自由参数。
//!
//! ## 参考
//! - J. Humlíček, JQSRT 27, 437 (1982)，四区域有理近似（相对误差约 1e-4）
//!
//! ## 依赖关系
//! - 被 `xrd/fit.rs` 调用
//! - 使用 `num-complex` 进行复数运算

use num_complex::Complex64;
use std::f64::consts::PI;

/// Voigt 参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoigtParams {
    /// 积分面积
    pub amplitude: f64,
    /// 峰中心
    pub center: f64,
    /// Gaussian 宽度 σ（Lorentzian 宽度 γ 与之相等）
    pub sigma: f64,
}

impl VoigtParams {
    /// 自由参数个数
    pub const COUNT: usize = 3;

    pub fn to_array(self) -> [f64; 3] {
        [self.amplitude, self.center, self.sigma]
    }

    pub fn from_array(p: [f64; 3]) -> Self {
        VoigtParams {
            amplitude: p[0],
            center: p[1],
            sigma: p[2],
        }
    }

    /// 在 x 处的函数值
    pub fn evaluate(&self, x: f64) -> f64 {
        voigt(x, self.amplitude, self.center, self.sigma, self.sigma)
    }

    /// 半高全宽（Olivero 近似）
    pub fn fwhm(&self) -> f64 {
        let fg = 2.0 * self.sigma * (2.0 * 2.0_f64.ln()).sqrt();
        let fl = 2.0 * self.sigma;
        0.5346 * fl + (0.2166 * fl * fl + fg * fg).sqrt()
    }
}

/// Voigt 函数
pub fn voigt(x: f64, amplitude: f64, center: f64, sigma: f64, gamma: f64) -> f64 {
    let s2 = sigma * std::f64::consts::SQRT_2;
    let z = Complex64::new((x - center) / s2, gamma / s2);
    amplitude * faddeeva(z).re / (sigma * (2.0 * PI).sqrt())
}

/// Faddeeva 函数 w(z) = exp(-z²) erfc(-iz)，要求 Im z >= 0
pub fn faddeeva(z: Complex64) -> Complex64 {
    let x = z.re;
    let y = z.im;
    let t = Complex64::new(y, -x);
    let s = x.abs() + y;

    if s >= 15.0 {
        // 区域 I
        t * 0.5641896 / (0.5 + t * t)
    } else if s >= 5.5 {
        // 区域 II
        let u = t * t;
        t * (1.410474 + u * 0.5641896) / (0.75 + u * (3.0 + u))
    } else if y >= 0.195 * x.abs() - 0.176 {
        // 区域 III
        (16.4955 + t * (20.20933 + t * (11.96482 + t * (3.778987 + t * 0.5642236))))
            / (16.4955
                + t * (38.82363 + t * (39.27121 + t * (21.69274 + t * (6.699398 + t)))))
    } else {
        // 区域 IV
        let u = t * t;
        let num = t
            * (36183.31
                - u * (3321.9905
                    - u * (1540.787 - u * (219.0313 - u * (35.76683 - u * (1.320522 - u * 0.56419))))));
        let den = 32066.6
            - u * (24322.84
                - u * (9022.228
                    - u * (2186.181 - u * (364.2191 - u * (61.57037 - u * (1.841439 - u))))));
        u.exp() - num / den
    }
}
