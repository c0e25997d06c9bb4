//! # calibrate 子命令实现
//!
//! 由标准样品的 2θ 扫描标定入射束波长。
//!
//! ## 功能
//! - 读取 d 间距参考表并打印
//! - 支持单文件和目录批量处理（rayon 并行）
//! - 每个扫描输出 (平均波长, 标准差) 及逐峰明细
//! - 可选图表 (PNG/SVG) 与 CSV 导出
//!
//! ## 依赖关系
//! - 使用 `cli/calibrate.rs` 定义的 CalibrateArgs
//! - 使用 `batch/` 模块进行批量处理
//! - 使用 `xrd/` 模块进行计算
//! - 使用 `parsers/` 读取数据

use crate::batch::{BatchResult, BatchRunner, FileCollector, ProcessResult};
use crate::cli::calibrate::{CalibrateArgs, PlotFormat};
use crate::error::{CalibError, Result};
use crate::models::{ReferenceTable, Scan};
use crate::parsers;
use crate::utils::output;
use crate::xrd::plot::{self, PlotOptions};
use crate::xrd::{self, Calibration, DetectorConfig, FitConfig, WavelengthCalibrator};

use std::fs;
use std::path::{Path, PathBuf};

/// 执行波长标定
pub fn execute(args: CalibrateArgs) -> Result<()> {
    output::print_header("Wavelength Calibration");

    let reference = load_reference(&args)?;
    print_reference_table(&reference);

    if args.input.is_file() {
        execute_single_file(&args, &reference)
    } else if args.input.is_dir() {
        execute_batch(&args, &reference)
    } else {
        Err(CalibError::FileNotFound {
            path: args.input.display().to_string(),
        })
    }
}

/// 读取参考表
fn load_reference(args: &CalibrateArgs) -> Result<ReferenceTable> {
    let mut reference = parsers::parse_reference_file(&args.reference, args.skip_rows)?;
    if args.unit_order {
        reference = reference.with_unit_order();
    }
    if reference.is_empty() {
        return Err(CalibError::InvalidArgument(format!(
            "reference table '{}' has no d-spacings",
            args.reference.display()
        )));
    }
    output::print_success(&format!(
        "Loaded {} reference reflections from '{}'",
        reference.len(),
        args.reference.display()
    ));
    Ok(reference)
}

/// 单文件模式
fn execute_single_file(args: &CalibrateArgs, reference: &ReferenceTable) -> Result<()> {
    output::print_info(&format!("Single file mode: '{}'", args.input.display()));

    let settings = CalibrationSettings::from_args(args);
    settings.prepare_output()?;

    let result = calibrate_file(&args.input, reference, &settings)?;
    report_calibration(&result);

    let results = vec![result];
    export_results(args, &results)?;
    output::print_done("Calibration complete");
    Ok(())
}

/// 批量处理模式
fn execute_batch(args: &CalibrateArgs, reference: &ReferenceTable) -> Result<()> {
    output::print_info(&format!("Batch mode: directory '{}'", args.input.display()));

    let collector = FileCollector::new(args.input.clone())
        .with_pattern(&args.pattern)
        .recursive(args.recursive);
    let files = collector.collect();

    if files.is_empty() {
        output::print_warning(&format!(
            "No matching files found with pattern '{}'",
            args.pattern
        ));
        return Ok(());
    }

    output::print_info(&format!("Found {} scan files", files.len()));

    let settings = CalibrationSettings::from_args(args);
    settings.prepare_output()?;

    let result = run_batch(&files, reference, &settings, args.jobs);

    for calibration in &result.outputs {
        report_calibration(calibration);
    }

    output::print_separator();
    output::print_success(&format!(
        "Batch complete: {}/{} success, {} skipped, {} failed",
        result.success(),
        result.total(),
        result.skipped,
        result.failed()
    ));

    if !result.failures.is_empty() {
        output::print_warning("Failed files:");
        for (path, err) in result.failures.iter().take(10) {
            output::print_error(&format!("  {}: {}", path, err));
        }
        if result.failures.len() > 10 {
            output::print_warning(&format!("  ... and {} more", result.failures.len() - 10));
        }
    }

    if result.outputs.len() > 1 {
        let means: Vec<f64> = result.outputs.iter().map(|c| c.mean).collect();
        if let Some((mean, std)) = xrd::wavelength::mean_std(&means) {
            output::print_info(&format!(
                "Mean over {} scans: λ = {:.6} Å (std {:.6} Å)",
                means.len(),
                mean,
                std
            ));
        }
    }

    export_results(args, &result.outputs)?;
    Ok(())
}

/// 标定配置（跨线程共享）
struct CalibrationSettings {
    calibrator: WavelengthCalibrator,
    input_root: PathBuf,
    plot_dir: Option<PathBuf>,
    plot_extension: &'static str,
    plot_options: PlotOptions,
}

impl CalibrationSettings {
    fn from_args(args: &CalibrateArgs) -> Self {
        let detector = DetectorConfig {
            sides: args.sides,
            intensity_threshold: args.threshold,
            order: args.order,
        };
        let fit = FitConfig {
            max_iterations: args.max_iterations,
            ..FitConfig::default()
        };

        CalibrationSettings {
            calibrator: WavelengthCalibrator::new(detector, fit),
            input_root: args.input.clone(),
            plot_dir: args.plot.then(|| args.plot_dir.clone()),
            plot_extension: args.plot_format.extension(),
            plot_options: PlotOptions {
                width: args.width,
                height: args.height,
                use_svg: args.plot_format == PlotFormat::Svg,
            },
        }
    }

    /// 图表路径，文件名取自扫描相对于输入目录的路径
    fn plot_path(&self, dir: &Path, source: &Path, scan: &Scan) -> PathBuf {
        let stem = source
            .strip_prefix(&self.input_root)
            .ok()
            .filter(|rel| !rel.as_os_str().is_empty())
            .map(|rel| {
                rel.with_extension("")
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("_")
            })
            .unwrap_or_else(|| scan.name.clone());
        dir.join(format!("{}_peaks.{}", stem, self.plot_extension))
    }

    /// 确保图表目录存在
    fn prepare_output(&self) -> Result<()> {
        if let Some(dir) = &self.plot_dir {
            fs::create_dir_all(dir).map_err(|e| CalibError::FileWriteError {
                path: dir.display().to_string(),
                source: e,
            })?;
        }
        Ok(())
    }
}

/// 并行标定文件列表
fn run_batch(
    files: &[PathBuf],
    reference: &ReferenceTable,
    settings: &CalibrationSettings,
    jobs: usize,
) -> BatchResult<Calibration> {
    let runner = BatchRunner::new(jobs);
    runner.run(files, |file| {
        let scan = match parsers::parse_chi_file(file) {
            Ok(scan) => scan,
            Err(e) => return ProcessResult::Failed(file.display().to_string(), e.to_string()),
        };
        // 没有数据行的扫描不参与标定
        if scan.is_empty() {
            return ProcessResult::Skipped(file.display().to_string());
        }
        match calibrate_scan(&scan, file, reference, settings) {
            Ok(calibration) => ProcessResult::Success(calibration),
            Err(e) => ProcessResult::Failed(file.display().to_string(), e.to_string()),
        }
    })
}

/// 标定单个扫描文件
fn calibrate_file(
    path: &Path,
    reference: &ReferenceTable,
    settings: &CalibrationSettings,
) -> Result<Calibration> {
    let scan = parsers::parse_chi_file(path)?;
    calibrate_scan(&scan, path, reference, settings)
}

/// 标定已读入的扫描，按需绘图
fn calibrate_scan(
    scan: &Scan,
    source: &Path,
    reference: &ReferenceTable,
    settings: &CalibrationSettings,
) -> Result<Calibration> {
    let calibration = settings.calibrator.calibrate(scan, reference)?;

    if let Some(dir) = &settings.plot_dir {
        let plot_path = settings.plot_path(dir, source, scan);
        plot::generate_scan_plot(scan, &calibration, &plot_path, &settings.plot_options)?;
    }

    Ok(calibration)
}

/// 导出 CSV
fn export_results(args: &CalibrateArgs, results: &[Calibration]) -> Result<()> {
    if let Some(path) = &args.output_csv {
        xrd::export::summary_to_csv(results, path)?;
        output::print_success(&format!("Summary saved to '{}'", path.display()));
    }
    if let Some(path) = &args.peaks_csv {
        xrd::export::samples_to_csv(results, path)?;
        output::print_success(&format!("Peak samples saved to '{}'", path.display()));
    }
    Ok(())
}

/// 打印参考表
fn print_reference_table(reference: &ReferenceTable) {
    use tabled::{Table, Tabled};

    #[derive(Tabled)]
    struct ReferenceRow {
        #[tabled(rename = "#")]
        index: usize,
        #[tabled(rename = "d (Å)")]
        d_spacing: String,
        #[tabled(rename = "n")]
        multiplicity: String,
    }

    let rows: Vec<ReferenceRow> = reference
        .entries
        .iter()
        .enumerate()
        .map(|(i, e)| ReferenceRow {
            index: i,
            d_spacing: format!("{:.5}", e.d_spacing),
            multiplicity: format!("{}", e.multiplicity),
        })
        .collect();

    println!("{}", Table::new(&rows));
}

/// 打印单个扫描的标定结果
fn report_calibration(calibration: &Calibration) {
    use tabled::{Table, Tabled};

    #[derive(Tabled)]
    struct SampleRow {
        #[tabled(rename = "side")]
        side: String,
        #[tabled(rename = "2θ (°)")]
        center: String,
        #[tabled(rename = "d (Å)")]
        d_spacing: String,
        #[tabled(rename = "n")]
        multiplicity: String,
        #[tabled(rename = "λ (Å)")]
        wavelength: String,
        #[tabled(rename = "Δ2θ (°)")]
        residual: String,
    }

    #[derive(Tabled)]
    struct FitRow {
        #[tabled(rename = "window")]
        window: String,
        #[tabled(rename = "center (°)")]
        center: String,
        #[tabled(rename = "σ (°)")]
        sigma: String,
        #[tabled(rename = "FWHM (°)")]
        fwhm: String,
        #[tabled(rename = "area")]
        amplitude: String,
        #[tabled(rename = "RSS")]
        residual: String,
        #[tabled(rename = "iter")]
        iterations: usize,
    }

    output::print_header(&format!("Scan '{}'", calibration.scan_name));
    output::print_info(&format!(
        "Detected {} peaks, fitted {}",
        calibration.detected.len(),
        calibration.fitted.len()
    ));

    let fits: Vec<FitRow> = calibration
        .fitted
        .iter()
        .map(|p| FitRow {
            window: format!("[{}, {})", p.window.left, p.window.right),
            center: format!("{:.4}", p.center()),
            sigma: format!("{:.4}", p.params.sigma),
            fwhm: format!("{:.4}", p.params.fwhm()),
            amplitude: format!("{:.4e}", p.params.amplitude),
            residual: format!("{:.3e}", p.residual),
            iterations: p.iterations,
        })
        .collect();
    println!("{}", Table::new(&fits));

    let rows: Vec<SampleRow> = calibration
        .samples
        .iter()
        .zip(calibration.residuals())
        .map(|(s, r)| SampleRow {
            side: s.side.to_string(),
            center: format!("{:.4}", s.center),
            d_spacing: format!("{:.5}", s.d_spacing),
            multiplicity: format!("{}", s.multiplicity),
            wavelength: format!("{:.6}", s.wavelength),
            residual: r.map(|v| format!("{:+.4}", v)).unwrap_or_else(|| "-".to_string()),
        })
        .collect();
    println!("{}", Table::new(&rows));

    if calibration.unpaired() > 0 {
        output::print_warning(&format!(
            "{} fitted peaks had no reference reflection and were ignored",
            calibration.unpaired()
        ));
    }

    output::print_success(&result_line(calibration));
}

/// 标定结果行
fn result_line(calibration: &Calibration) -> String {
    format!(
        "(mean, std) = ({:.6}, {:.6}) Å from {} peaks",
        calibration.mean,
        calibration.std,
        calibration.samples.len()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::xrd::voigt::VoigtParams;
    use clap::Parser;

    fn test_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("xpdcal-{}-{}", name, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn parse_args(argv: &[&str]) -> CalibrateArgs {
        let mut full = vec!["xpdcal", "calibrate"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Calibrate(args) => args,
            _ => panic!("expected calibrate"),
        }
    }

    fn write_reference(dir: &Path) -> PathBuf {
        let path = dir.join("std_d.txt");
        fs::write(&path, "standard\nd n\n---\n2.0 1\n1.5 1\n").unwrap();
        path
    }

    fn write_two_peak_scan(path: &Path) {
        let mut text = String::new();
        for i in 0..=2000 {
            let x = -20.0 + i as f64 * 0.02;
            let y: f64 = [-10.0, 10.0]
                .iter()
                .map(|&c| {
                    VoigtParams {
                        amplitude: 1.0,
                        center: c,
                        sigma: 0.01,
                    }
                    .evaluate(x)
                })
                .sum();
            text.push_str(&format!("{:.6} {:.10}\n", x, y));
        }
        fs::write(path, text).unwrap();
    }

    #[test]
    fn test_empty_directory_is_not_an_error() {
        let dir = test_dir("empty");
        let data = dir.join("data");
        fs::create_dir_all(&data).unwrap();
        let reference = write_reference(&dir);

        let summary = dir.join("summary.csv");
        let args = parse_args(&[
            data.to_str().unwrap(),
            "-r",
            reference.to_str().unwrap(),
            "--output-csv",
            summary.to_str().unwrap(),
        ]);
        execute(args).unwrap();
        // 未进行任何标定，因此不写出汇总
        assert!(!summary.exists());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_end_to_end_directory() {
        let dir = test_dir("e2e");
        let data = dir.join("data");
        fs::create_dir_all(&data).unwrap();
        let reference = write_reference(&dir);
        write_two_peak_scan(&data.join("lab6_0001.chi"));
        fs::write(data.join("README.txt"), "not a scan\n").unwrap();

        let args = parse_args(&[
            data.to_str().unwrap(),
            "-r",
            reference.to_str().unwrap(),
            "-j",
            "1",
        ]);
        let reference = load_reference(&args).unwrap();
        let settings = CalibrationSettings::from_args(&args);
        let files = FileCollector::new(data.clone()).collect();
        assert_eq!(files.len(), 1);

        let result = run_batch(&files, &reference, &settings, 1);
        assert_eq!(result.success(), 1);
        let calibration = &result.outputs[0];

        let samples: Vec<f64> = calibration
            .fitted
            .iter()
            .map(|p| xrd::wavelength::lamda_from_bragg(p.center().abs().to_radians(), 2.0, 1.0))
            .collect();
        let (mean, std) = xrd::wavelength::mean_std(&samples).unwrap();
        assert!((calibration.mean - mean).abs() < 1e-12);
        assert!((calibration.std - std).abs() < 1e-12);

        let exact = xrd::wavelength::lamda_from_bragg(10.0_f64.to_radians(), 2.0, 1.0);
        assert!((calibration.mean - exact).abs() < 1e-4);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_single_file_with_exports() {
        let dir = test_dir("single");
        let reference = write_reference(&dir);
        let scan = dir.join("lab6.chi");
        write_two_peak_scan(&scan);
        let summary = dir.join("summary.csv");
        let peaks = dir.join("peaks.csv");

        let args = parse_args(&[
            scan.to_str().unwrap(),
            "-r",
            reference.to_str().unwrap(),
            "--output-csv",
            summary.to_str().unwrap(),
            "--peaks-csv",
            peaks.to_str().unwrap(),
        ]);
        execute(args).unwrap();

        assert!(summary.exists());
        assert_eq!(fs::read_to_string(&peaks).unwrap().lines().count(), 3);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_bad_scans_do_not_abort_batch() {
        let dir = test_dir("flat");
        let data = dir.join("data");
        fs::create_dir_all(&data).unwrap();
        let reference = write_reference(&dir);
        let flat: String = (0..100).map(|i| format!("{} 5.0\n", i as f64 - 50.0)).collect();
        fs::write(data.join("flat.chi"), flat).unwrap();
        fs::write(data.join("empty.chi"), "# header only\n").unwrap();
        write_two_peak_scan(&data.join("good.chi"));

        let args = parse_args(&[data.to_str().unwrap(), "-r", reference.to_str().unwrap()]);
        let reference = load_reference(&args).unwrap();
        let settings = CalibrationSettings::from_args(&args);
        let files = FileCollector::new(data.clone()).collect();

        let result = run_batch(&files, &reference, &settings, 2);
        assert_eq!(result.success(), 1);
        assert_eq!(result.failed(), 1);
        assert_eq!(result.skipped, 1);
        assert_eq!(result.total(), 3);
        assert!(result.failures[0].0.ends_with("flat.chi"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_plot_names_unique_across_subdirectories() {
        let dir = test_dir("plotnames");
        let data = dir.join("data");
        let reference = write_reference(&dir);
        let args = parse_args(&[
            data.to_str().unwrap(),
            "-r",
            reference.to_str().unwrap(),
            "--plot",
            "--recursive",
        ]);
        let settings = CalibrationSettings::from_args(&args);
        let scan = Scan::new("x", vec![], vec![]).unwrap();
        let plots = Path::new("plots");

        let a = settings.plot_path(plots, &data.join("a").join("x.chi"), &scan);
        let b = settings.plot_path(plots, &data.join("b").join("x.chi"), &scan);
        assert_eq!(a, plots.join("a_x_peaks.png"));
        assert_eq!(b, plots.join("b_x_peaks.png"));

        // 单文件模式：输入即扫描本身，使用扫描名
        let single = parse_args(&[
            data.join("x.chi").to_str().unwrap(),
            "-r",
            reference.to_str().unwrap(),
        ]);
        let settings = CalibrationSettings::from_args(&single);
        assert_eq!(
            settings.plot_path(plots, &data.join("x.chi"), &scan),
            plots.join("x_peaks.png")
        );

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_result_line_reports_each_value_once() {
        let scan = crate::xrd::wavelength::tests::synthetic_scan(&[-10.0, 10.0], 0.01);
        let reference = ReferenceTable::from_columns(&[2.0, 1.5], &[1.0, 1.0]);
        let calibration = WavelengthCalibrator::default()
            .calibrate(&scan, &reference)
            .unwrap();

        let line = result_line(&calibration);
        let mean = format!("{:.6}", calibration.mean);
        assert_eq!(line.matches(&mean).count(), 1, "{}", line);
        assert!(line.ends_with("from 2 peaks"));
    }

    #[test]
    fn test_missing_input() {
        let dir = test_dir("missing");
        let reference = write_reference(&dir);
        let args = parse_args(&[
            dir.join("nope.chi").to_str().unwrap(),
            "-r",
            reference.to_str().unwrap(),
        ]);
        assert!(matches!(execute(args), Err(CalibError::FileNotFound { .. })));
        fs::remove_dir_all(&dir).ok();
    }
}
