use thiserror::Error;
use std::io;
use std::path::PathBuf;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Can't find input file: {0:?}")]
    InputNotFound(PathBuf),

    #[error("No whitespace within {chunk_size} bytes after offset {offset}; a chunk boundary would split a word")]
    ChunkBoundaryUnresolvable { offset: u64, chunk_size: usize },

    #[error("Storage unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Report error: {0}")]
    Report(String),

    #[error("Worker thread error: {0}")]
    Worker(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
}

// Type alias for Result
pub type Result<T> = std::result::Result<T, Error>;

// Helper functions for common error conversions
impl Error {
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Error::StoreUnavailable(msg.into())
    }

    pub fn query<S: Into<String>>(msg: S) -> Self {
        Error::QueryFailed(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    pub fn report<S: Into<String>>(msg: S) -> Self {
        Error::Report(msg.into())
    }

    pub fn worker<S: Into<String>>(msg: S) -> Self {
        Error::Worker(msg.into())
    }
}
