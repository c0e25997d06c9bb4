//! # 衍射峰检测
//!
//! 在强度序列中寻找候选衍射峰，并为每个峰给出用于拟合的窗口。
//!
//! ## 算法概述
//! 1. 寻找 `order` 阶局部极大值（邻点下标越界时截断到数组端点）
//! 2. 去除距离数组两端不足 `sides` 个点的极大值
//! 3. 要求峰高不低于左右各 `sides` 个点处强度的 2 倍，且不低于阈值
//! 4. 输出窗口 `[center - sides, center + sides)`，截断到 `[0, len]`
//!
//! ## 依赖关系
//! - 被 `xrd/wavelength.rs` 调用
//! - 无外部模块依赖

/// 峰检测参数
#[derive(Debug, Clone, Copy)]
pub struct DetectorConfig {
    /// 峰两侧对称半宽（点数）
    pub sides: usize,
    /// 最低峰高
    pub intensity_threshold: f64,
    /// 局部极大值的比较阶数
    pub order: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            sides: 3,
            intensity_threshold: 0.0,
            order: 5,
        }
    }
}

/// 峰窗口：左右边界（右开区间）及峰中心下标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeakWindow {
    pub left: usize,
    pub right: usize,
    pub center: usize,
}

/// 检测结果：三个等长的并列序列
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectedPeaks {
    pub left: Vec<usize>,
    pub right: Vec<usize>,
    pub centers: Vec<usize>,
}

impl DetectedPeaks {
    pub fn len(&self) -> usize {
        self.centers.len()
    }

    /// 按检测顺序迭代窗口
    pub fn windows(&self) -> impl Iterator<Item = PeakWindow> + '_ {
        self.left
            .iter()
            .zip(&self.right)
            .zip(&self.centers)
            .map(|((&left, &right), &center)| PeakWindow {
                left,
                right,
                center,
            })
    }
}

/// 局部极大值下标（升序）
///
/// 点 `i` 需严格大于 `i ± 1 ..= i ± order` 范围内的每个点，
/// 越界的邻点下标截断到数组端点，因此首尾两点永远不是极大值。
pub fn relative_maxima(data: &[f64], order: usize) -> Vec<usize> {
    let n = data.len();
    if n == 0 {
        return Vec::new();
    }
    let order = order.max(1);
    let last = n - 1;

    (0..n)
        .filter(|&i| {
            (1..=order).all(|shift| {
                let right = (i + shift).min(last);
                let left = i.saturating_sub(shift);
                data[i] > data[right] && data[i] > data[left]
            })
        })
        .collect()
}

/// 检测衍射峰
pub fn find_peaks(chi: &[f64], config: &DetectorConfig) -> DetectedPeaks {
    let n = chi.len();
    let sides = config.sides;
    let mut peaks = DetectedPeaks::default();

    for p in relative_maxima(chi, config.order) {
        // 两侧至少需要 sides 个点
        if p < sides || p + sides >= n {
            continue;
        }

        let height = chi[p];
        let drops_right = height >= 2.0 * chi[p + sides];
        let drops_left = height >= 2.0 * chi[p - sides];
        if !(drops_right && drops_left && height >= config.intensity_threshold) {
            continue;
        }

        peaks.left.push(p.saturating_sub(sides));
        peaks.right.push((p + sides).min(n));
        peaks.centers.push(p);
    }

    peaks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spikes(n: usize, at: &[usize], height: f64) -> Vec<f64> {
        let mut data = vec![1.0; n];
        for &i in at {
            data[i] = height;
            data[i - 1] = height * 0.6;
            data[i + 1] = height * 0.6;
        }
        data
    }

    #[test]
    fn test_relative_maxima_order() {
        let data = [0.0, 1.0, 0.0, 2.0, 3.0, 2.0, 0.0];
        assert_eq!(relative_maxima(&data, 1), vec![1, 4]);
        assert_eq!(relative_maxima(&data, 3), vec![4]);
    }

    #[test]
    fn test_relative_maxima_edges_never_qualify() {
        let data = [5.0, 1.0, 0.0, 1.0, 5.0];
        assert!(relative_maxima(&data, 1).is_empty());
    }

    #[test]
    fn test_find_injected_peaks() {
        let data = spikes(200, &[40, 100, 160], 50.0);
        let peaks = find_peaks(&data, &DetectorConfig::default());
        assert_eq!(peaks.centers, vec![40, 100, 160]);
        assert_eq!(peaks.left, vec![37, 97, 157]);
        assert_eq!(peaks.right, vec![43, 103, 163]);
    }

    #[test]
    fn test_peaks_near_edges_rejected() {
        // 下标 2 与 n-3 处的峰距边缘不足 sides=3
        let mut data = vec![1.0; 60];
        data[2] = 40.0;
        data[57] = 40.0;
        data[30] = 40.0;
        let config = DetectorConfig {
            order: 1,
            ..Default::default()
        };
        let peaks = find_peaks(&data, &config);
        assert_eq!(peaks.centers, vec![30]);
    }

    #[test]
    fn test_flat_array_has_no_peaks() {
        let data = vec![7.0; 100];
        for threshold in [-10.0, 0.0, 7.0, 100.0] {
            let config = DetectorConfig {
                intensity_threshold: threshold,
                ..Default::default()
            };
            assert!(find_peaks(&data, &config).centers.is_empty());
        }
    }

    #[test]
    fn test_empty_input() {
        let peaks = find_peaks(&[], &DetectorConfig::default());
        assert_eq!(peaks.len(), 0);
        assert!(peaks.left.is_empty() && peaks.right.is_empty());
    }

    #[test]
    fn test_threshold_and_drop_criteria() {
        let mut data = spikes(100, &[30, 70], 50.0);
        // 70 处峰的右侧 sides 点抬高，不满足 2 倍条件
        data[73] = 30.0;
        let peaks = find_peaks(&data, &DetectorConfig::default());
        assert_eq!(peaks.centers, vec![30]);

        let config = DetectorConfig {
            intensity_threshold: 60.0,
            ..Default::default()
        };
        assert!(find_peaks(&data, &config).centers.is_empty());
    }
}
