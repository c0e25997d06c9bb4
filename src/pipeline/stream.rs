//! # 数据文档流
//!
//! 数据源按顺序发出 start / descriptor / event / stop 文档，
//! 通过显式注册的通道同步转发给下游接收端，没有全局订阅表。
//!
//! ## 依赖关系
//! - 被 `commands/setup.rs` 使用
//! - 使用 `pipeline/config.rs` 的 AnalysisConfig
//! - 使用 `std::sync::mpsc` 通道

use crate::error::{CalibError, Result};
use crate::models::Scan;
use crate::pipeline::config::AnalysisConfig;

use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver, Sender};

/// 数据文档
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Start {
        uid: String,
        metadata: BTreeMap<String, String>,
    },
    Descriptor {
        run_uid: String,
        keys: Vec<String>,
    },
    Event {
        seq_num: usize,
        data: BTreeMap<String, f64>,
    },
    Stop {
        run_uid: String,
        exit_status: String,
        num_events: usize,
    },
}

impl Record {
    pub fn kind(&self) -> &'static str {
        match self {
            Record::Start { .. } => "start",
            Record::Descriptor { .. } => "descriptor",
            Record::Event { .. } => "event",
            Record::Stop { .. } => "stop",
        }
    }
}

/// 数据源
pub struct DataSource {
    name: String,
    subscribers: Vec<Sender<Record>>,
}

impl DataSource {
    pub fn new(name: impl Into<String>) -> Self {
        DataSource {
            name: name.into(),
            subscribers: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 注册下游通道
    pub fn subscribe(&mut self, tx: Sender<Record>) {
        self.subscribers.push(tx);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// 发出一个文档，返回送达的接收端数
    ///
    /// 已断开的接收端会被移除；若所有接收端都已断开则返回错误。
    pub fn emit(&mut self, record: Record) -> Result<usize> {
        if self.subscribers.is_empty() {
            return Ok(0);
        }
        self.subscribers.retain(|tx| tx.send(record.clone()).is_ok());
        if self.subscribers.is_empty() {
            return Err(CalibError::SinkDisconnected(self.name.clone()));
        }
        Ok(self.subscribers.len())
    }
}

/// 接收端
pub struct Sink {
    name: String,
    tx: Sender<Record>,
    rx: Receiver<Record>,
}

impl Sink {
    pub fn new(name: impl Into<String>) -> Self {
        let (tx, rx) = mpsc::channel();
        Sink {
            name: name.into(),
            tx,
            rx,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 订阅指定数据源
    pub fn connect(&self, source: &mut DataSource) {
        source.subscribe(self.tx.clone());
    }

    /// 取出已收到的全部文档（不阻塞）
    pub fn drain(&self) -> Vec<Record> {
        self.rx.try_iter().collect()
    }
}

/// 将扫描作为一次完整运行发出
pub fn replay_scan(source: &mut DataSource, scan: &Scan, config: &AnalysisConfig) -> Result<usize> {
    let uid = format!("{}-{}", scan.name, std::process::id());

    let mut metadata = BTreeMap::new();
    metadata.insert("sample_name".to_string(), scan.name.clone());
    metadata.insert("mode".to_string(), config.mode.to_string());
    metadata.insert("exp_db".to_string(), config.exp_db.clone());
    if let Some(path) = config.calibration_file() {
        metadata.insert("calibration_file".to_string(), path.display().to_string());
    }

    let mut emitted = 0;
    source.emit(Record::Start {
        uid: uid.clone(),
        metadata,
    })?;
    emitted += 1;

    source.emit(Record::Descriptor {
        run_uid: uid.clone(),
        keys: vec!["tth".to_string(), "intensity".to_string()],
    })?;
    emitted += 1;

    for (i, (&tth, &intensity)) in scan.two_theta.iter().zip(&scan.intensity).enumerate() {
        let mut data = BTreeMap::new();
        data.insert("tth".to_string(), tth);
        data.insert("intensity".to_string(), intensity);
        source.emit(Record::Event {
            seq_num: i + 1,
            data,
        })?;
        emitted += 1;
    }

    source.emit(Record::Stop {
        run_uid: uid,
        exit_status: "success".to_string(),
        num_events: scan.len(),
    })?;
    emitted += 1;

    Ok(emitted)
}
