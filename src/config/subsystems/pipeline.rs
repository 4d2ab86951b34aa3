// src/config/subsystems/pipeline.rs

use serde::{Serialize, Deserialize};
use std::path::PathBuf;
use log::LevelFilter;
use crate::error::{Error, Result};
use crate::config::FromIni;

pub const DEFAULT_CHUNK_SIZE: usize = 64;

/// How chunks travel from the segmenter to the workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionMode {
    /// Read a batch, drain it with a scoped pool, merge, repeat.
    Batch,
    /// Reader thread, fixed worker pool and a single aggregator run concurrently.
    Streaming,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Batch => "batch",
            ExecutionMode::Streaming => "streaming",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "batch" => Some(Self::Batch),
            "streaming" | "stream" | "pipelined" => Some(Self::Streaming),
            _ => None,
        }
    }
}

impl Default for ExecutionMode {
    fn default() -> Self {
        Self::Streaming
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    // Requested chunk window in bytes
    pub chunk_size: usize,

    // 0 means one worker per available core
    pub worker_count: usize,

    // Task queue bound for streaming mode, 0 for unbounded
    pub queue_capacity: usize,

    // Chunks enqueued per pool pass in batch mode, 0 means worker_count
    pub batch_chunks: usize,

    pub mode: ExecutionMode,

    // Log settings
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    #[serde(skip)]
    level_filter: Option<LevelFilter>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            worker_count: 0,
            queue_capacity: 64,
            batch_chunks: 0,
            mode: ExecutionMode::default(),
            log_level: "info".to_string(),
            log_file: None,
            level_filter: Some(LevelFilter::Info),
        }
    }
}

fn parse_level(value: &str) -> Option<LevelFilter> {
    match value.trim().to_lowercase().as_str() {
        "error" => Some(LevelFilter::Error),
        "warn" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        "none" | "off" => Some(LevelFilter::Off),
        _ => None,
    }
}

impl FromIni for PipelineConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "pipeline" {
            return None;
        }

        match key {
            "chunk_size" => {
                match value.parse() {
                    Ok(size) if size > 0 => {
                        self.chunk_size = size;
                        Some(Ok(()))
                    },
                    _ => Some(Err(Error::Config(
                        format!("Invalid chunk_size (must be > 0): {}", value)
                    ))),
                }
            },
            "worker_count" | "workers" => {
                match value.parse() {
                    Ok(num) => {
                        self.worker_count = num;
                        Some(Ok(()))
                    },
                    Err(_) => Some(Err(Error::Config(
                        format!("Invalid worker_count: {}", value)
                    ))),
                }
            },
            "queue_capacity" => {
                match value.parse() {
                    Ok(capacity) => {
                        self.queue_capacity = capacity;
                        Some(Ok(()))
                    },
                    Err(_) => Some(Err(Error::Config(
                        format!("Invalid queue_capacity: {}", value)
                    ))),
                }
            },
            "batch_chunks" => {
                match value.parse() {
                    Ok(count) => {
                        self.batch_chunks = count;
                        Some(Ok(()))
                    },
                    Err(_) => Some(Err(Error::Config(
                        format!("Invalid batch_chunks: {}", value)
                    ))),
                }
            },
            "mode" => {
                match ExecutionMode::from_str(value) {
                    Some(mode) => {
                        self.mode = mode;
                        Some(Ok(()))
                    },
                    None => Some(Err(Error::Config(
                        format!("Invalid mode (must be 'batch' or 'streaming'): {}", value)
                    ))),
                }
            },
            "log_level" => {
                Some(self.set_log_level(value))
            },
            "log_file" => {
                self.log_file = Some(PathBuf::from(value.trim_matches('"')));
                Some(Ok(()))
            },
            _ => None,
        }
    }
}

impl PipelineConfig {
    pub fn set_log_level(&mut self, value: &str) -> Result<()> {
        match parse_level(value) {
            Some(level) => {
                self.log_level = value.trim().to_lowercase();
                self.level_filter = Some(level);
                Ok(())
            },
            None => Err(Error::Config(
                format!("Invalid log level '{}'. Must be one of: none, error, warn, info, debug, trace", value)
            )),
        }
    }

    pub fn get_log_level(&self) -> LevelFilter {
        if let Some(level) = self.level_filter {
            return level;
        }
        parse_level(&self.log_level).unwrap_or(LevelFilter::Info)
    }

    /// Worker count with the `0 = all cores` rule applied.
    pub fn effective_workers(&self) -> usize {
        if self.worker_count == 0 {
            num_cpus::get().max(1)
        } else {
            self.worker_count
        }
    }

    pub fn effective_batch_chunks(&self) -> usize {
        if self.batch_chunks == 0 {
            self.effective_workers()
        } else {
            self.batch_chunks
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::Config(
                "chunk_size must be greater than 0".to_string()
            ));
        }
        Ok(())
    }
}
