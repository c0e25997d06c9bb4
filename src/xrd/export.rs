//! # 标定结果导出
//!
//! 导出每个扫描的波长汇总以及逐峰明细到 CSV。
//!
//! ## 支持格式
//! - 汇总 CSV: scan, wavelength, std, n_samples, n_peaks
//! - 明细 CSV: scan, side, rank, 2theta, d_spacing, n, wavelength
//!
//! ## 依赖关系
//! - 被 `commands/calibrate.rs` 调用
//! - 使用 `xrd/wavelength.rs` 的 Calibration 结构
//! - 使用 `csv` 库写入 CSV 文件

use crate::error::{CalibError, Result};
use crate::xrd::Calibration;

use std::path::Path;

/// 导出波长汇总
pub fn summary_to_csv(results: &[Calibration], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    wtr.write_record(["scan", "wavelength", "std", "n_samples", "n_peaks"])?;

    for result in results {
        wtr.write_record(&[
            result.scan_name.clone(),
            format!("{:.8}", result.mean),
            format!("{:.8}", result.std),
            result.samples.len().to_string(),
            result.fitted.len().to_string(),
        ])?;
    }

    wtr.flush().map_err(|e| CalibError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}

/// 导出逐峰明细
pub fn samples_to_csv(results: &[Calibration], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    wtr.write_record([
        "scan",
        "side",
        "rank",
        "2theta",
        "d_spacing",
        "n",
        "wavelength",
    ])?;

    for result in results {
        for s in &result.samples {
            wtr.write_record(&[
                result.scan_name.clone(),
                s.side.to_string(),
                s.rank.to_string(),
                format!("{:.6}", s.center),
                format!("{:.6}", s.d_spacing),
                format!("{}", s.multiplicity),
                format!("{:.8}", s.wavelength),
            ])?;
        }
    }

    wtr.flush().map_err(|e| CalibError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

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
    fn test_export_csv() {
        let dir = std::env::temp_dir().join(format!("xpdcal-export-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let scan = synthetic_scan(&[-10.0, 10.0], 0.01);
        let reference = ReferenceTable::from_columns(&[2.0], &[1.0]);
        let result = WavelengthCalibrator::default()
            .calibrate(&scan, &reference)
            .unwrap();

        let summary = dir.join("summary.csv");
        let samples = dir.join("samples.csv");
        summary_to_csv(std::slice::from_ref(&result), &summary).unwrap();
        samples_to_csv(std::slice::from_ref(&result), &samples).unwrap();

        let text = fs::read_to_string(&summary).unwrap();
        assert!(text.starts_with("scan,wavelength,std,n_samples,n_peaks"));
        assert!(text.contains("synthetic"));

        let text = fs::read_to_string(&samples).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.contains("right") && text.contains("left"));

        fs::remove_dir_all(&dir).ok();
    }
}
