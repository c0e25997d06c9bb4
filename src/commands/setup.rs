//! # setup 子命令实现
//!
//! 装配分析环境：确定运行模式，构建配置对象，登记标定文件路径，
//! 并把数据源的输出转发给下游接收端。
//!
//! ## 依赖关系
//! - 使用 `cli/setup.rs` 定义的 SetupArgs
//! - 使用 `pipeline/` 的配置与数据流
//! - 使用 `parsers/chi.rs` 读取回放扫描

use crate::cli::setup::SetupArgs;
use crate::error::Result;
use crate::parsers;
use crate::pipeline::stream::replay_scan;
use crate::pipeline::{AnalysisConfig, DataSource, Sink};
use crate::utils::output;

/// 装配完成的分析环境
pub struct Environment {
    pub config: AnalysisConfig,
    pub source: DataSource,
    pub sink: Sink,
}

/// 按参数构建分析环境
pub fn build_environment(args: &SetupArgs) -> Environment {
    let mut config = AnalysisConfig::new(args.mode, args.config_base.clone(), args.db.clone());
    config.register_calibration_file();

    let mut source = DataSource::new(args.source.clone());
    let sink = Sink::new(args.sink.clone());
    sink.connect(&mut source);

    Environment {
        config,
        source,
        sink,
    }
}

/// 执行 setup 命令
pub fn execute(args: SetupArgs) -> Result<()> {
    output::print_header("Analysis Environment Setup");

    let mut env = build_environment(&args);
    print_config_table(&env.config);

    output::print_success(&format!(
        "Subscribed '{}' -> '{}' ({} subscriber(s))",
        env.source.name(),
        env.sink.name(),
        env.source.subscriber_count()
    ));

    if let Some(path) = &args.replay {
        let scan = parsers::parse_chi_file(path)?;
        output::print_info(&format!(
            "Replaying '{}' ({} points) through '{}'",
            path.display(),
            scan.len(),
            env.source.name()
        ));

        let emitted = replay_scan(&mut env.source, &scan, &env.config)?;
        let received = env.sink.drain();
        let events = received
            .iter()
            .filter(|r| r.kind() == "event")
            .count();

        output::print_success(&format!(
            "Emitted {} records, '{}' received {} ({} events)",
            emitted,
            env.sink.name(),
            received.len(),
            events
        ));
    }

    output::print_done("Environment ready");
    Ok(())
}

/// 打印配置
fn print_config_table(config: &AnalysisConfig) {
    use tabled::{Table, Tabled};

    #[derive(Tabled)]
    struct ConfigRow {
        #[tabled(rename = "Key")]
        key: String,
        #[tabled(rename = "Value")]
        value: String,
    }

    let mut rows = vec![
        ConfigRow {
            key: "mode".to_string(),
            value: format!("{} ({})", config.mode, config.mode.code()),
        },
        ConfigRow {
            key: "config_base".to_string(),
            value: config.config_base.display().to_string(),
        },
        ConfigRow {
            key: "exp_db".to_string(),
            value: config.exp_db.clone(),
        },
    ];
    rows.extend(config.calibration_md.iter().map(|(k, v)| ConfigRow {
        key: format!("calibration_md.{}", k),
        value: v.clone(),
    }));

    println!("{}", Table::new(&rows));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::pipeline::config::{CALIB_FILE_KEY, CALIB_FILE_NAME};
    use crate::pipeline::stream::Record;
    use crate::pipeline::Mode;
    use clap::Parser;
    use std::fs;
    use std::path::PathBuf;

    fn parse_args(argv: &[&str]) -> SetupArgs {
        let mut full = vec!["xpdcal", "setup"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Setup(args) => args,
            _ => panic!("expected setup"),
        }
    }

    #[test]
    fn test_build_environment() {
        let args = parse_args(&["--mode", "test", "--config-base", "/srv/xpd/config"]);
        let mut env = build_environment(&args);

        assert_eq!(env.config.mode, Mode::Test);
        assert_eq!(
            env.config.calibration_md.get(CALIB_FILE_KEY),
            Some(
                &PathBuf::from("/srv/xpd/config")
                    .join(CALIB_FILE_NAME)
                    .display()
                    .to_string()
            )
        );

        let record = Record::Descriptor {
            run_uid: "r".to_string(),
            keys: vec!["tth".to_string()],
        };
        assert_eq!(env.source.emit(record.clone()).unwrap(), 1);
        assert_eq!(env.sink.drain(), vec![record]);
    }

    #[test]
    fn test_execute_with_replay() {
        let dir = std::env::temp_dir().join(format!("xpdcal-setup-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let scan = dir.join("scan.chi");
        fs::write(&scan, "-1.0 2.0\n0.0 8.0\n1.0 3.0\n").unwrap();

        let args = parse_args(&[
            "--mode",
            "1",
            "--config-base",
            dir.to_str().unwrap(),
            "--replay",
            scan.to_str().unwrap(),
        ]);
        execute(args).unwrap();

        fs::remove_dir_all(&dir).ok();
    }
}
