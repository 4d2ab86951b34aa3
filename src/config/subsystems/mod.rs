pub mod pipeline;
pub mod storage;
pub mod report;

pub use pipeline::{PipelineConfig, ExecutionMode};
pub use storage::StorageConfig;
pub use report::{ReportConfig, ReportFormat};
