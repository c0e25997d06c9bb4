//! # Voigt 峰拟合
//!
//! 对每个峰窗口内的数据做 Levenberg–Marquardt 最小二乘拟合，精修峰中心。
//!
//! ## 算法概述
//! 1. 从数据本身估计初值（最大值位置、半高宽）
//! 2. 中心差分计算 Jacobian，组装 3×3 法方程 JᵀJ
//! 3. Marquardt 阻尼 (JᵀJ + λ·diag(JᵀJ)) δ = -Jᵀr，按残差下降调整 λ
//! 4. 残差相对下降、步长或梯度低于容差时收敛
//!
//! ## 依赖关系
//! - 被 `xrd/wavelength.rs` 调用
//! - 使用 `xrd/voigt.rs` 的线型
//! - 使用 `nalgebra` 求解法方程

use crate::error::{CalibError, Result};
use crate::xrd::detect::PeakWindow;
use crate::xrd::voigt::VoigtParams;

use nalgebra::{Matrix3, Vector3};

/// 拟合控制参数
#[derive(Debug, Clone, Copy)]
pub struct FitConfig {
    pub max_iterations: usize,
    /// 残差平方和相对下降容差
    pub ftol: f64,
    /// 参数步长相对容差
    pub xtol: f64,
    /// 梯度容差
    pub gtol: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        FitConfig {
            max_iterations: 200,
            ftol: 1e-10,
            xtol: 1e-10,
            gtol: 1e-14,
        }
    }
}

/// 拟合得到的峰
#[derive(Debug, Clone)]
pub struct FittedPeak {
    pub window: PeakWindow,
    pub params: VoigtParams,
    /// 残差平方和
    pub residual: f64,
    pub iterations: usize,
}

impl FittedPeak {
    pub fn center(&self) -> f64 {
        self.params.center
    }
}

/// 从峰形数据估计 Voigt 初值
pub fn guess(x: &[f64], y: &[f64]) -> VoigtParams {
    let maxy = y.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let miny = y.iter().copied().fold(f64::INFINITY, f64::min);
    let maxx = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let minx = x.iter().copied().fold(f64::INFINITY, f64::min);

    let argmax = y
        .iter()
        .enumerate()
        .fold(0, |best, (i, &v)| if v > y[best] { i } else { best });

    let mut center = x[argmax];
    let height = (maxy - miny) * 3.0;
    let mut sigma = (maxx - minx) / 6.0;

    let half = (maxy + miny) / 2.0;
    let above: Vec<f64> = x
        .iter()
        .zip(y)
        .filter(|(_, v)| **v > half)
        .map(|(&xi, _)| xi)
        .collect();
    if above.len() > 2 {
        let lo = above.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = above.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        sigma = (hi - lo) / 2.0;
        center = above.iter().sum::<f64>() / above.len() as f64;
    }

    VoigtParams {
        amplitude: height * sigma * 1.5,
        center,
        sigma: sigma * 0.65,
    }
}

/// 在窗口数据上拟合 Voigt 峰
pub fn fit_voigt(x: &[f64], y: &[f64], window: PeakWindow, config: &FitConfig) -> Result<FittedPeak> {
    let n = x.len().min(y.len());
    if n < VoigtParams::COUNT {
        return Err(CalibError::WindowTooSmall {
            left: window.left,
            right: window.right,
            len: n,
            needed: VoigtParams::COUNT,
        });
    }
    let (x, y) = (&x[..n], &y[..n]);

    let start = guess(x, y);
    let nominal = start.center;
    let mut p = Vector3::from(start.to_array());
    let mut cost = sum_of_squares(x, y, &p);
    if !cost.is_finite() {
        return Err(CalibError::NonFinite { center: nominal });
    }

    let mut lambda = 1e-3;

    for iteration in 1..=config.max_iterations {
        let (jtj, g) = normal_equations(x, y, &p);

        if g.amax() <= config.gtol {
            return finish(window, p, cost, iteration);
        }

        // 增大 λ 直到残差下降
        loop {
            let mut a = jtj;
            for k in 0..3 {
                a[(k, k)] += lambda * jtj[(k, k)].max(1e-12);
            }

            let delta = a
                .lu()
                .solve(&(-g))
                .ok_or(CalibError::SingularMatrix { center: nominal })?;
            let trial = p + delta;

            let valid = trial.iter().all(|v| v.is_finite()) && trial[2] > 0.0;
            let trial_cost = if valid {
                sum_of_squares(x, y, &trial)
            } else {
                f64::INFINITY
            };

            if trial_cost < cost {
                let reduction = cost - trial_cost;
                let small_step = delta.norm() <= config.xtol * (p.norm() + config.xtol);
                p = trial;
                cost = trial_cost;
                lambda = (lambda / 10.0).max(1e-12);

                if reduction <= config.ftol * cost || small_step {
                    return finish(window, p, cost, iteration);
                }
                break;
            }

            lambda *= 10.0;
            if lambda > 1e16 {
                // 无法再下降，已位于极小值
                return finish(window, p, cost, iteration);
            }
        }
    }

    Err(CalibError::NotConverged {
        iterations: config.max_iterations,
        center: nominal,
    })
}

fn finish(window: PeakWindow, p: Vector3<f64>, cost: f64, iterations: usize) -> Result<FittedPeak> {
    if !p.iter().all(|v| v.is_finite()) || !cost.is_finite() {
        return Err(CalibError::NonFinite { center: p[1] });
    }
    Ok(FittedPeak {
        window,
        params: VoigtParams::from_array([p[0], p[1], p[2]]),
        residual: cost,
        iterations,
    })
}

fn model(p: &Vector3<f64>) -> VoigtParams {
    VoigtParams::from_array([p[0], p[1], p[2]])
}

fn sum_of_squares(x: &[f64], y: &[f64], p: &Vector3<f64>) -> f64 {
    let m = model(p);
    x.iter()
        .zip(y)
        .map(|(&xi, &yi)| {
            let r = m.evaluate(xi) - yi;
            r * r
        })
        .sum()
}

/// 组装 JᵀJ 与梯度 Jᵀr（中心差分 Jacobian）
fn normal_equations(x: &[f64], y: &[f64], p: &Vector3<f64>) -> (Matrix3<f64>, Vector3<f64>) {
    let m = model(p);
    let steps = p.map(|v| 1e-7 * v.abs().max(1.0));

    let mut jtj = Matrix3::zeros();
    let mut g = Vector3::zeros();

    for (&xi, &yi) in x.iter().zip(y) {
        let mut row = Vector3::zeros();
        for k in 0..3 {
            let mut hi = *p;
            let mut lo = *p;
            hi[k] += steps[k];
            lo[k] -= steps[k];
            row[k] = (model(&hi).evaluate(xi) - model(&lo).evaluate(xi)) / (2.0 * steps[k]);
        }
        let r = m.evaluate(xi) - yi;
        jtj += row * row.transpose();
        g += row * r;
    }

    (jtj, g)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(n: usize) -> PeakWindow {
        PeakWindow {
            left: 0,
            right: n,
            center: n / 2,
        }
    }

    #[test]
    fn test_guess_centers_on_maximum() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0];
        let y = [1.0, 2.0, 9.0, 2.0, 1.0];
        let g = guess(&x, &y);
        assert_eq!(g.center, 2.0);
        assert!(g.sigma > 0.0);
        assert!(g.amplitude > 0.0);
    }

    #[test]
    fn test_fit_recovers_exact_voigt() {
        let truth = VoigtParams {
            amplitude: 5.0,
            center: 12.34,
            sigma: 0.04,
        };
        let x: Vec<f64> = (0..21).map(|i| 12.14 + i as f64 * 0.02).collect();
        let y: Vec<f64> = x.iter().map(|&xi| truth.evaluate(xi)).collect();

        let fitted = fit_voigt(&x, &y, window(x.len()), &FitConfig::default()).unwrap();
        assert!((fitted.center() - truth.center).abs() < 1e-4);
        assert!((fitted.params.sigma - truth.sigma).abs() < 1e-3);
        assert!((fitted.params.amplitude - truth.amplitude).abs() / truth.amplitude < 1e-2);
    }

    #[test]
    fn test_fit_off_grid_center() {
        let truth = VoigtParams {
            amplitude: 1.0,
            center: -7.013,
            sigma: 0.03,
        };
        let x: Vec<f64> = (0..15).map(|i| -7.15 + i as f64 * 0.02).collect();
        let y: Vec<f64> = x.iter().map(|&xi| truth.evaluate(xi) + 0.5).collect();

        // 常数背景不在模型内，中心仍应落在一个采样间隔以内
        let fitted = fit_voigt(&x, &y, window(x.len()), &FitConfig::default()).unwrap();
        assert!((fitted.center() - truth.center).abs() < 0.02);
    }

    #[test]
    fn test_fit_window_too_small() {
        let result = fit_voigt(&[1.0, 2.0], &[3.0, 4.0], window(2), &FitConfig::default());
        assert!(matches!(result, Err(CalibError::WindowTooSmall { len: 2, .. })));

        let result = fit_voigt(&[], &[], window(0), &FitConfig::default());
        assert!(matches!(result, Err(CalibError::WindowTooSmall { len: 0, .. })));
    }
}
