// storage/mod.rs

pub mod metrics;
pub mod lmdb;

use std::path::Path;

use crate::error::Result;
use crate::types::{FrequencyTable, PositionTable};
use crate::config::subsystems::storage::StorageConfig;

/// The two tables every store keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// word -> occurrence count
    Frequency,
    /// emoticon code -> space-joined positions
    Emoticons,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Frequency => lmdb::config::DB_FREQUENCY,
            Table::Emoticons => lmdb::config::DB_EMOTICONS,
        }
    }
}

/// Serialize positions the way the emoticon table stores them.
pub fn join_positions(positions: &[u64]) -> String {
    positions
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a stored position string. Extra whitespace is tolerated.
pub fn split_positions(stored: &str) -> Result<Vec<u64>> {
    stored
        .split_whitespace()
        .map(|p| {
            p.parse::<u64>().map_err(|_| {
                crate::error::Error::query(format!("Corrupt position value {:?} in emoticon table", p))
            })
        })
        .collect()
}

/// Interface of the persistent store behind the aggregator.
///
/// Writes are applied by a single writer. Every batched call lands in one
/// write transaction, so a batch is either fully visible or not at all.
pub trait StorageBackend: Send {
    /// `count = existing + delta`, inserting the word when absent.
    fn upsert_add(&mut self, word: &str, delta: u64) -> Result<()>;

    /// Overwrite one row. Frequency values must be decimal counts.
    fn insert_or_replace(&mut self, table: Table, key: &str, value: &str) -> Result<()>;

    /// Append positions to whatever the code already has stored.
    fn append_positions(&mut self, code: &str, positions: &[u64]) -> Result<()>;

    /// `upsert_add` for every entry, in one transaction.
    fn upsert_add_batch(&mut self, counts: &FrequencyTable) -> Result<()>;

    /// `append_positions` for every entry, in one transaction.
    fn append_positions_batch(&mut self, positions: &PositionTable) -> Result<()>;

    /// Highest counts first, ties broken by word ascending.
    fn top_n_by_value(&self, n: usize) -> Result<Vec<(String, u64)>>;

    /// Every row of a table as text, in key order.
    fn scan_all(&self, table: Table) -> Result<Vec<(String, String)>>;

    fn frequency_table(&self) -> Result<FrequencyTable>;

    fn position_table(&self) -> Result<PositionTable>;

    /// Empty both tables.
    fn clear(&mut self) -> Result<()>;

    /// Grow the store so that a run over `input_size` bytes fits. Never shrinks.
    fn reserve_for_input(&mut self, input_size: u64) -> Result<()>;

    /// Flush to disk regardless of the configured sync mode.
    fn sync(&self) -> Result<()>;

    fn close(&mut self) -> Result<()>;
}

/// Open the store at `path`. Unless `keep_existing` is set the tables start empty.
pub fn create_storage<P: AsRef<Path>>(path: P, config: &StorageConfig, file_size: Option<u64>) -> Result<lmdb::LMDBStorage> {
    let mut storage = lmdb::LMDBStorage::new(path, config, file_size)?;
    if !config.keep_existing {
        storage.clear()?;
    }
    Ok(storage)
}
