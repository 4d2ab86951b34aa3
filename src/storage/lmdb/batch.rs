// storage/lmdb/batch.rs

use log::{debug, trace};
use lmdb_rkv::{RwTransaction, Transaction, WriteFlags, Error as LmdbError};

use crate::error::{Error, Result};
use crate::types::{FrequencyTable, PositionTable};
use crate::storage::{join_positions, Table};

use super::LMDBStorage;

impl LMDBStorage {
    /// Run `apply` inside one write transaction. Any error aborts the whole
    /// transaction; nothing from a failed batch becomes visible.
    fn with_write_txn<F>(&self, what: &str, apply: F) -> Result<()>
    where
        F: FnOnce(&mut RwTransaction<'_>) -> Result<()>,
    {
        self.ensure_open()?;

        let mut txn = self.env.begin_rw_txn()
            .map_err(|e| Error::storage(format!("Failed to start write transaction: {}", e)))?;

        if let Err(e) = apply(&mut txn) {
            txn.abort();
            self.metrics.increment_failed_ops();
            return Err(e);
        }

        txn.commit().map_err(|e| {
            self.metrics.increment_failed_ops();
            Error::storage(format!("Failed to commit {}: {}", what, e))
        })?;

        self.metrics.increment_transactions();
        debug!("Committed {}", what);
        Ok(())
    }

    fn add_in_txn(&self, txn: &mut RwTransaction<'_>, word: &str, delta: u64) -> Result<u64> {
        Self::check_key(word)?;

        let current = match txn.get(self.frequency_db, &word) {
            Ok(bytes) => Self::decode_count(word.as_bytes(), bytes)?,
            Err(LmdbError::NotFound) => 0,
            Err(e) => return Err(Error::storage(format!("Failed to read count for {:?}: {}", word, e))),
        };

        let updated = current.saturating_add(delta);
        txn.put(self.frequency_db, &word, &Self::encode_count(updated), WriteFlags::empty())
            .map_err(|e| Error::storage(format!("Failed to store count for {:?}: {}", word, e)))?;

        trace!("{:?}: {} -> {}", word, current, updated);
        Ok(updated)
    }

    fn append_in_txn(&self, txn: &mut RwTransaction<'_>, code: &str, positions: &[u64]) -> Result<usize> {
        Self::check_key(code)?;
        if positions.is_empty() {
            return Ok(0);
        }

        let joined = join_positions(positions);
        let value = match txn.get(self.emoticon_db, &code) {
            Ok(existing) if !existing.is_empty() => {
                let mut value = Vec::with_capacity(existing.len() + 1 + joined.len());
                value.extend_from_slice(existing);
                value.push(b' ');
                value.extend_from_slice(joined.as_bytes());
                value
            },
            Ok(_) | Err(LmdbError::NotFound) => joined.into_bytes(),
            Err(e) => return Err(Error::storage(format!("Failed to read positions for {:?}: {}", code, e))),
        };

        txn.put(self.emoticon_db, &code, &value, WriteFlags::empty())
            .map_err(|e| Error::storage(format!("Failed to store positions for {:?}: {}", code, e)))?;

        Ok(value.len())
    }

    pub fn upsert_add(&mut self, word: &str, delta: u64) -> Result<()> {
        self.with_write_txn("counter update", |txn| self.add_in_txn(txn, word, delta).map(|_| ()))?;
        self.metrics.record_counter_updates(1);
        self.metrics.record_bytes_written((word.len() + 8) as u64);
        Ok(())
    }

    pub fn upsert_add_batch(&mut self, counts: &FrequencyTable) -> Result<()> {
        if counts.is_empty() {
            return Ok(());
        }

        let mut bytes = 0u64;
        self.with_write_txn("counter batch", |txn| {
            for (word, &delta) in counts {
                self.add_in_txn(txn, word, delta)?;
                bytes += (word.len() + 8) as u64;
            }
            Ok(())
        })?;

        self.metrics.record_counter_updates(counts.len());
        self.metrics.record_bytes_written(bytes);
        Ok(())
    }

    pub fn append_positions(&mut self, code: &str, positions: &[u64]) -> Result<()> {
        let mut written = 0;
        self.with_write_txn("position append", |txn| {
            written = self.append_in_txn(txn, code, positions)?;
            Ok(())
        })?;
        self.metrics.record_position_appends(1);
        self.metrics.record_bytes_written(written as u64);
        Ok(())
    }

    pub fn append_positions_batch(&mut self, positions: &PositionTable) -> Result<()> {
        if positions.is_empty() {
            return Ok(());
        }

        let mut bytes = 0u64;
        self.with_write_txn("position batch", |txn| {
            for (code, list) in positions {
                bytes += self.append_in_txn(txn, code, list)? as u64;
            }
            Ok(())
        })?;

        self.metrics.record_position_appends(positions.len());
        self.metrics.record_bytes_written(bytes);
        Ok(())
    }

    pub fn insert_or_replace(&mut self, table: Table, key: &str, value: &str) -> Result<()> {
        Self::check_key(key)?;

        let encoded: Vec<u8> = match table {
            Table::Frequency => {
                let count: u64 = value.trim().parse().map_err(|_| {
                    Error::storage(format!("Frequency value for {:?} is not a count: {:?}", key, value))
                })?;
                Self::encode_count(count).to_vec()
            },
            Table::Emoticons => value.as_bytes().to_vec(),
        };

        let db = self.db_for(table);
        self.with_write_txn("replace", |txn| {
            txn.put(db, &key, &encoded, WriteFlags::empty())
                .map_err(|e| Error::storage(format!("Failed to replace {:?} in {}: {}", key, table.name(), e)))
        })?;

        self.metrics.increment_replacements();
        self.metrics.record_bytes_written((key.len() + encoded.len()) as u64);
        Ok(())
    }

    /// Remove every row from both tables.
    pub fn clear(&mut self) -> Result<()> {
        let (frequency_db, emoticon_db) = (self.frequency_db, self.emoticon_db);
        self.with_write_txn("table reset", |txn| {
            for (db, table) in [(frequency_db, Table::Frequency), (emoticon_db, Table::Emoticons)] {
                txn.clear_db(db)
                    .map_err(|e| Error::storage(format!("Failed to clear {}: {}", table.name(), e)))?;
            }
            Ok(())
        })?;
        debug!("Cleared store at {:?}", self.db_path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::subsystems::storage::StorageConfig;
    use tempfile::tempdir;

    fn open(dir: &std::path::Path) -> LMDBStorage {
        LMDBStorage::new(dir, &StorageConfig::default(), None).expect("open store")
    }

    #[test]
    fn test_upsert_add_inserts_then_adds() {
        let dir = tempdir().expect("temp dir");
        let mut store = open(dir.path());
        store.upsert_add("fox", 2).expect("insert");
        store.upsert_add("fox", 3).expect("add");
        store.upsert_add("dog", 1).expect("insert");

        let table = store.frequency_table().expect("scan");
        assert_eq!(table.get("fox"), Some(&5));
        assert_eq!(table.get("dog"), Some(&1));
    }

    #[test]
    fn test_positions_are_appended_not_overwritten() {
        let dir = tempdir().expect("temp dir");
        let mut store = open(dir.path());
        store.append_positions(":-)", &[1, 9]).expect("first append");
        store.append_positions(":-)", &[20]).expect("second append");
        store.append_positions(":-)", &[]).expect("empty append");

        let rows = store.scan_all(Table::Emoticons).expect("scan");
        assert_eq!(rows, vec![(":-)".to_string(), "1 9 20".to_string())]);
    }

    #[test]
    fn test_insert_or_replace_overwrites() {
        let dir = tempdir().expect("temp dir");
        let mut store = open(dir.path());
        store.upsert_add("word", 7).expect("insert");
        store.insert_or_replace(Table::Frequency, "word", "2").expect("replace");
        store.insert_or_replace(Table::Emoticons, ":(", "4 5").expect("replace");

        assert_eq!(store.frequency_table().expect("scan").get("word"), Some(&2));
        assert_eq!(store.position_table().expect("scan").get(":("), Some(&vec![4, 5]));
        assert!(store.insert_or_replace(Table::Frequency, "word", "many").is_err());
    }

    #[test]
    fn test_batches_apply_every_entry() {
        let dir = tempdir().expect("temp dir");
        let mut store = open(dir.path());

        let mut counts = FrequencyTable::default();
        counts.insert("a".to_string(), 2);
        counts.insert("b".to_string(), 1);
        store.upsert_add_batch(&counts).expect("first batch");
        store.upsert_add_batch(&counts).expect("second batch");

        let mut positions = PositionTable::default();
        positions.insert(":)".to_string(), vec![3]);
        store.append_positions_batch(&positions).expect("positions");
        positions.insert(":)".to_string(), vec![8, 12]);
        store.append_positions_batch(&positions).expect("positions");

        let table = store.frequency_table().expect("scan");
        assert_eq!(table.get("a"), Some(&4));
        assert_eq!(table.get("b"), Some(&2));
        assert_eq!(store.position_table().expect("scan").get(":)"), Some(&vec![3, 8, 12]));
        assert_eq!(store.metrics().get_stats().transactions, 4);
    }

    #[test]
    fn test_oversized_key_fails_whole_batch() {
        let dir = tempdir().expect("temp dir");
        let mut store = open(dir.path());

        let mut counts = FrequencyTable::default();
        counts.insert("fine".to_string(), 1);
        counts.insert("x".repeat(600), 1);
        assert!(matches!(store.upsert_add_batch(&counts), Err(Error::StoreUnavailable(_))));
        assert!(store.frequency_table().expect("scan").is_empty());
    }

    #[test]
    fn test_clear_empties_both_tables() {
        let dir = tempdir().expect("temp dir");
        let mut store = open(dir.path());
        store.upsert_add("a", 1).expect("insert");
        store.append_positions(":]", &[5]).expect("append");
        store.clear().expect("clear");

        assert!(store.scan_all(Table::Frequency).expect("scan").is_empty());
        assert!(store.scan_all(Table::Emoticons).expect("scan").is_empty());
    }

    #[test]
    fn test_closed_store_rejects_writes() {
        let dir = tempdir().expect("temp dir");
        let mut store = open(dir.path());
        store.close().expect("close");
        assert!(store.upsert_add("a", 1).is_err());
        store.close().expect("second close is a no-op");
    }
}
