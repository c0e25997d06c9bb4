//! # 扫描与峰位图表
//!
//! 使用 `plotters` 绘制 2θ 扫描曲线，标出检测到的峰与拟合峰中心。
//!
//! ## 功能
//! - 扫描曲线（折线）
//! - 检测峰位红色圆点标记
//! - 拟合中心竖线
//! - 支持 PNG 和 SVG 输出
//!
//! ## 依赖关系
//! - 被 `commands/calibrate.rs` 调用
//! - 使用 `xrd/wavelength.rs` 的 Calibration 结构
//! - 使用 `plotters` 渲染图表

use crate::error::{CalibError, Result};
use crate::models::Scan;
use crate::xrd::Calibration;

use plotters::prelude::*;
use std::path::Path;

/// 图表输出选项
#[derive(Debug, Clone, Copy)]
pub struct PlotOptions {
    pub width: u32,
    pub height: u32,
    pub use_svg: bool,
}

impl Default for PlotOptions {
    fn default() -> Self {
        PlotOptions {
            width: 1200,
            height: 800,
            use_svg: false,
        }
    }
}

/// 生成扫描图表
pub fn generate_scan_plot(
    scan: &Scan,
    calibration: &Calibration,
    output_path: &Path,
    options: &PlotOptions,
) -> Result<()> {
    let size = (options.width, options.height);
    if options.use_svg {
        let root = SVGBackend::new(output_path, size).into_drawing_area();
        draw_scan_chart(&root, scan, calibration)?;
        root.present().map_err(|e| CalibError::PlotError(e.to_string()))?;
    } else {
        let root = BitMapBackend::new(output_path, size).into_drawing_area();
        draw_scan_chart(&root, scan, calibration)?;
        root.present().map_err(|e| CalibError::PlotError(e.to_string()))?;
    }
    Ok(())
}

/// 绘制扫描图表的核心逻辑
fn draw_scan_chart<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    scan: &Scan,
    calibration: &Calibration,
) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)
        .map_err(|e| CalibError::PlotError(format!("{:?}", e)))?;

    let (x_min, x_max) = match scan.angle_range() {
        Some((lo, hi)) if hi > lo => (lo, hi),
        _ => (-1.0, 1.0),
    };
    let y_max = scan.max_intensity().max(1e-12) * 1.1;

    let mut chart = ChartBuilder::on(root)
        .caption(&scan.name, ("sans-serif", 28).into_font())
        .margin(30)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(x_min..x_max, 0.0..y_max)
        .map_err(|e| CalibError::PlotError(format!("{:?}", e)))?;

    chart
        .configure_mesh()
        .x_desc("2θ (°)")
        .y_desc("Intensity")
        .x_label_style(("sans-serif", 16))
        .y_label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 18))
        .draw()
        .map_err(|e| CalibError::PlotError(format!("{:?}", e)))?;

    // 扫描曲线
    let line_color = RGBColor(0, 102, 204);
    chart
        .draw_series(LineSeries::new(
            scan.two_theta
                .iter()
                .zip(&scan.intensity)
                .map(|(x, y)| (*x, y.max(0.0))),
            line_color.stroke_width(1),
        ))
        .map_err(|e| CalibError::PlotError(format!("{:?}", e)))?;

    // 拟合中心
    let fit_color = RGBColor(0, 153, 76);
    for peak in &calibration.fitted {
        let c = peak.center();
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(c, 0.0), (c, y_max)],
                fit_color.mix(0.5).stroke_width(1),
            )))
            .map_err(|e| CalibError::PlotError(format!("{:?}", e)))?;
    }

    // 检测峰位
    chart
        .draw_series(calibration.detected.centers.iter().map(|&i| {
            Circle::new((scan.two_theta[i], scan.intensity[i]), 4, RED.filled())
        }))
        .map_err(|e| CalibError::PlotError(format!("{:?}", e)))?;

    let wavelength_text = format!(
        "λ = {:.6} ± {:.6} Å",
        calibration.mean, calibration.std
    );
    chart
        .draw_series(std::iter::once(Text::new(
            wavelength_text,
            (x_min + 0.05 * (x_max - x_min), y_max * 0.95),
            ("sans-serif", 16).into_font().color(&BLACK),
        )))
        .map_err(|e| CalibError::PlotError(format!("{:?}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ReferenceTable;
    use crate::xrd::wavelength::tests::synthetic_scan;
    use crate::xrd::WavelengthCalibrator;
    use std::fs;

    #[test]
    fn test_svg_plot_written() {
        let dir = std::env::temp_dir().join(format!("xpdcal-plot-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let scan = synthetic_scan(&[-10.0, 10.0], 0.01);
        let reference = ReferenceTable::from_columns(&[2.0, 1.5], &[1.0, 1.0]);
        let calibration = WavelengthCalibrator::default()
            .calibrate(&scan, &reference)
            .unwrap();

        let path = dir.join("synthetic_peaks.svg");
        let options = PlotOptions {
            use_svg: true,
            ..Default::default()
        };
        generate_scan_plot(&scan, &calibration, &path, &options).unwrap();

        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));

        fs::remove_dir_all(&dir).ok();
    }
}
