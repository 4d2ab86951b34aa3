// storage/lmdb/mod.rs

pub mod config;
pub mod init;
pub mod batch;
pub mod query;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use log::{info, debug};
use lmdb_rkv::{Environment, Database};

use crate::error::{Error, Result};
use crate::types::{FrequencyTable, PositionTable};
use crate::storage::metrics::StorageMetrics;
use super::{StorageBackend, Table};

pub struct LMDBStorage {
    pub(crate) env: Arc<Environment>,
    pub(crate) frequency_db: Database,
    pub(crate) emoticon_db: Database,
    pub(crate) metrics: Arc<StorageMetrics>,
    pub(crate) db_path: PathBuf,
    pub(crate) map_size: usize,
    pub(crate) closed: bool,
}

impl std::fmt::Debug for LMDBStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LMDBStorage")
            .field("db_path", &self.db_path.display())
            .field("map_size", &self.map_size)
            .field("closed", &self.closed)
            .finish()
    }
}

impl LMDBStorage {
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    pub fn metrics(&self) -> &StorageMetrics {
        &self.metrics
    }

    /// Current size of the memory map in bytes.
    pub fn map_size(&self) -> usize {
        self.map_size
    }

    /// Enlarge the memory map when `input_size` calls for more than it has.
    /// Must not be called while a transaction is open.
    pub fn reserve_for_input(&mut self, input_size: u64) -> Result<()> {
        self.ensure_open()?;
        let wanted = config::calculate_map_size_from_file_size(input_size);
        if wanted <= self.map_size {
            return Ok(());
        }

        info!(
            "Growing LMDB map at {:?} from {} MB to {} MB for a {} byte input",
            self.db_path,
            self.map_size / (1024 * 1024),
            wanted / (1024 * 1024),
            input_size
        );
        self.env.set_map_size(wanted)
            .map_err(|e| Error::storage(format!("Failed to resize LMDB map to {} bytes: {}", wanted, e)))?;
        self.map_size = wanted;
        Ok(())
    }

    pub(crate) fn db_for(&self, table: Table) -> Database {
        match table {
            Table::Frequency => self.frequency_db,
            Table::Emoticons => self.emoticon_db,
        }
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::storage(format!("Store at {:?} is closed", self.db_path)));
        }
        Ok(())
    }

    pub(crate) fn encode_count(count: u64) -> [u8; 8] {
        count.to_be_bytes()
    }

    pub(crate) fn decode_count(word: &[u8], bytes: &[u8]) -> Result<u64> {
        let raw: [u8; 8] = bytes.try_into().map_err(|_| {
            Error::query(format!(
                "Corrupt count for {:?}: expected 8 bytes, found {}",
                String::from_utf8_lossy(word),
                bytes.len()
            ))
        })?;
        Ok(u64::from_be_bytes(raw))
    }

    pub(crate) fn check_key(key: &str) -> Result<()> {
        if key.is_empty() {
            return Err(Error::storage("Empty keys cannot be stored"));
        }
        if key.len() > config::MAX_KEY_SIZE {
            return Err(Error::storage(format!(
                "Key of {} bytes exceeds the LMDB limit of {} bytes: {:.32}...",
                key.len(),
                config::MAX_KEY_SIZE,
                key
            )));
        }
        Ok(())
    }

    /// Force a flush to disk, even when opened with NO_SYNC.
    pub fn sync(&self) -> Result<()> {
        self.ensure_open()?;
        self.env.sync(true)
            .map_err(|e| Error::storage(format!("Failed to sync LMDB environment: {}", e)))
    }

    /// Flush and mark the store closed. The environment itself is released on drop.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            debug!("Store at {:?} already closed", self.db_path);
            return Ok(());
        }

        info!("Closing LMDB store at {:?}", self.db_path);
        self.sync()?;
        self.closed = true;
        info!("Store metrics: {}", self.metrics.get_stats());
        Ok(())
    }
}

impl Drop for LMDBStorage {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.env.sync(true) {
                log::warn!("Failed to sync store at {:?} on drop: {}", self.db_path, e);
            }
        }
    }
}

impl StorageBackend for LMDBStorage {
    fn upsert_add(&mut self, word: &str, delta: u64) -> Result<()> {
        self.upsert_add(word, delta)
    }

    fn insert_or_replace(&mut self, table: Table, key: &str, value: &str) -> Result<()> {
        self.insert_or_replace(table, key, value)
    }

    fn append_positions(&mut self, code: &str, positions: &[u64]) -> Result<()> {
        self.append_positions(code, positions)
    }

    fn upsert_add_batch(&mut self, counts: &FrequencyTable) -> Result<()> {
        self.upsert_add_batch(counts)
    }

    fn append_positions_batch(&mut self, positions: &PositionTable) -> Result<()> {
        self.append_positions_batch(positions)
    }

    fn top_n_by_value(&self, n: usize) -> Result<Vec<(String, u64)>> {
        self.top_n_by_value(n)
    }

    fn scan_all(&self, table: Table) -> Result<Vec<(String, String)>> {
        self.scan_all(table)
    }

    fn frequency_table(&self) -> Result<FrequencyTable> {
        self.frequency_table()
    }

    fn position_table(&self) -> Result<PositionTable> {
        self.position_table()
    }

    fn clear(&mut self) -> Result<()> {
        self.clear()
    }

    fn reserve_for_input(&mut self, input_size: u64) -> Result<()> {
        self.reserve_for_input(input_size)
    }

    fn sync(&self) -> Result<()> {
        self.sync()
    }

    fn close(&mut self) -> Result<()> {
        self.close()
    }
}
