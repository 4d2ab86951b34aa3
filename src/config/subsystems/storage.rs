// src/config/subsystems/storage.rs

use serde::{Serialize, Deserialize};
use std::path::PathBuf;
use crate::error::{Error, Result};
use crate::config::FromIni;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    // Presence switches the aggregator to the persistent store
    pub db_path: Option<PathBuf>,

    // I/O settings
    pub use_fsync: bool,

    // Accumulate into whatever the store already holds instead of resetting it
    pub keep_existing: bool,

    // LMDB-specific settings
    pub lmdb_max_readers: Option<u32>,     // Maximum number of reader slots
    pub lmdb_max_dbs: Option<u32>,         // Maximum number of named databases
    pub lmdb_map_size_mb: Option<usize>,   // Memory map size in megabytes
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            use_fsync: false,
            keep_existing: false,
            lmdb_max_readers: Some(126),
            lmdb_max_dbs: Some(4),
            lmdb_map_size_mb: None,
        }
    }
}

impl FromIni for StorageConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "storage" {
            return None;
        }

        match key {
            "db_path" => {
                let trimmed = value.trim_matches('"');
                self.db_path = if trimmed.is_empty() { None } else { Some(PathBuf::from(trimmed)) };
                Some(Ok(()))
            },
            "use_fsync" => {
                match value.parse() {
                    Ok(flag) => {
                        self.use_fsync = flag;
                        Some(Ok(()))
                    },
                    Err(_) => Some(Err(Error::Config(
                        format!("Invalid use_fsync value (must be true/false): {}", value)
                    ))),
                }
            },
            "keep_existing" => {
                match value.parse() {
                    Ok(flag) => {
                        self.keep_existing = flag;
                        Some(Ok(()))
                    },
                    Err(_) => Some(Err(Error::Config(
                        format!("Invalid keep_existing value (must be true/false): {}", value)
                    ))),
                }
            },
            "lmdb_max_readers" => {
                match value.parse() {
                    Ok(readers) if readers > 0 => {
                        self.lmdb_max_readers = Some(readers);
                        Some(Ok(()))
                    },
                    _ => Some(Err(Error::Config(
                        format!("Invalid lmdb_max_readers (must be > 0): {}", value)
                    ))),
                }
            },
            "lmdb_max_dbs" => {
                match value.parse() {
                    Ok(dbs) if dbs > 0 => {
                        self.lmdb_max_dbs = Some(dbs);
                        Some(Ok(()))
                    },
                    _ => Some(Err(Error::Config(
                        format!("Invalid lmdb_max_dbs (must be > 0): {}", value)
                    ))),
                }
            },
            "lmdb_map_size_mb" => {
                match value.parse() {
                    Ok(size) if size > 0 => {
                        self.lmdb_map_size_mb = Some(size);
                        Some(Ok(()))
                    },
                    _ => Some(Err(Error::Config(
                        format!("Invalid lmdb_map_size_mb (must be > 0): {}", value)
                    ))),
                }
            },
            _ => None,
        }
    }
}

impl StorageConfig {
    pub fn is_persistent(&self) -> bool {
        self.db_path.is_some()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(map_size) = self.lmdb_map_size_mb {
            if map_size < 10 {
                return Err(Error::Config(
                    "lmdb_map_size_mb should be at least 10MB".to_string()
                ));
            }
        }

        if let Some(dbs) = self.lmdb_max_dbs {
            if dbs < 2 {
                return Err(Error::Config(
                    "lmdb_max_dbs must allow the frequency and emoticon tables".to_string()
                ));
            }
        }

        Ok(())
    }

    /// Get a human-readable description of the configuration
    pub fn describe(&self) -> String {
        format!(
            "Storage Configuration:\n\
             - Database Path: {:?}\n\
             - Sync Mode: {}\n\
             - Keep Existing: {}\n\
             - LMDB Map Size: {}\n\
             - LMDB Max Readers: {}\n\
             - LMDB Max Databases: {}",
            self.db_path,
            if self.use_fsync { "sync (fsync)" } else { "async" },
            self.keep_existing,
            self.lmdb_map_size_mb.map_or_else(|| "derived from input size".to_string(), |mb| format!("{} MB", mb)),
            self.lmdb_max_readers.unwrap_or(126),
            self.lmdb_max_dbs.unwrap_or(4)
        )
    }
}
