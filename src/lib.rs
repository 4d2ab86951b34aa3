//! wordstat counts word frequencies and locates emoticons in large text files.
//! The input is split into whitespace-aligned chunks that a worker pool scans
//! concurrently; results are merged in memory or into an LMDB store and can be
//! queried as top-N words and emoticon positions.

// Module declarations
pub mod error;
pub mod types;
pub mod config;
pub mod scanner;
pub mod pipeline;
pub mod selector;
pub mod storage;
pub mod report;
pub mod engine;
pub mod utils;

// Re-exports
pub use error::{Error, Result};
pub use engine::WordStats;
pub use pipeline::{Aggregator, Pipeline};
pub use report::Report;
pub use types::{ChunkTask, FrequencyTable, PositionTable, ResultPair, RunSummary};

// Re-export the config from config module
pub use config::WordstatConfig;
pub use config::subsystems::{ExecutionMode, ReportFormat};
