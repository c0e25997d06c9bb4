//! # 运行模式与分析配置
//!
//! 运行模式由环境变量 `XPDAN_SETUP` 选择（0 = beamline, 1 = test,
//! 2 = simulation）。配置对象显式传递给需要它的函数。
//!
//! ## 依赖关系
//! - 被 `cli/setup.rs`、`commands/setup.rs` 使用
//! - 使用 `clap::ValueEnum` 解析模式

use crate::error::CalibError;

use clap::ValueEnum;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// 选择运行模式的环境变量
pub const MODE_ENV: &str = "XPDAN_SETUP";
/// 标定元数据中存放标定文件路径的键
pub const CALIB_FILE_KEY: &str = "file_path";
/// 标定信息文件名
pub const CALIB_FILE_NAME: &str = "xpdAcq_calib_info.yml";

/// 运行模式
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default, Serialize)]
pub enum Mode {
    /// Beamline operation (code 0)
    #[default]
    #[value(alias = "0")]
    Beamline,
    /// Test environment (code 1)
    #[value(alias = "1")]
    Test,
    /// Simulation (code 2)
    #[value(alias = "2")]
    Simulation,
}

impl Mode {
    pub fn code(self) -> u8 {
        match self {
            Mode::Beamline => 0,
            Mode::Test => 1,
            Mode::Simulation => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Mode::Beamline),
            1 => Some(Mode::Test),
            2 => Some(Mode::Simulation),
            _ => None,
        }
    }

    /// 默认配置根目录：beamline 使用用户目录，其余模式使用临时目录
    pub fn default_config_base(self) -> PathBuf {
        let root = match self {
            Mode::Beamline => std::env::var_os("HOME")
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
            Mode::Test | Mode::Simulation => std::env::temp_dir(),
        };
        root.join("xpdUser").join("config_base")
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Beamline => write!(f, "beamline"),
            Mode::Test => write!(f, "test"),
            Mode::Simulation => write!(f, "simulation"),
        }
    }
}

impl FromStr for Mode {
    type Err = CalibError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u8>() {
            return Mode::from_code(code).ok_or_else(|| CalibError::InvalidMode(s.to_string()));
        }
        <Mode as ValueEnum>::from_str(s, true).map_err(|_| CalibError::InvalidMode(s.to_string()))
    }
}

/// 分析配置
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisConfig {
    pub mode: Mode,
    /// 配置根目录
    pub config_base: PathBuf,
    /// 实验数据库名称
    pub exp_db: String,
    /// 标定元数据
    pub calibration_md: BTreeMap<String, String>,
}

impl AnalysisConfig {
    pub fn new(mode: Mode, config_base: Option<PathBuf>, exp_db: impl Into<String>) -> Self {
        AnalysisConfig {
            mode,
            config_base: config_base.unwrap_or_else(|| mode.default_config_base()),
            exp_db: exp_db.into(),
            calibration_md: BTreeMap::new(),
        }
    }

    /// 写入标定文件路径 `<config_base>/xpdAcq_calib_info.yml`
    pub fn register_calibration_file(&mut self) -> PathBuf {
        let path = self.config_base.join(CALIB_FILE_NAME);
        self.calibration_md.insert(
            CALIB_FILE_KEY.to_string(),
            path.display().to_string(),
        );
        path
    }

    pub fn calibration_file(&self) -> Option<&Path> {
        self.calibration_md.get(CALIB_FILE_KEY).map(Path::new)
    }
}
