// storage/lmdb/query.rs

use log::{debug, warn};
use lmdb_rkv::{Cursor, Database, Transaction};

use crate::error::{Error, Result};
use crate::selector;
use crate::storage::{split_positions, Table};
use crate::types::{FrequencyTable, PositionTable};

use super::LMDBStorage;

impl LMDBStorage {
    /// Walk every row of `db` in key order inside one read transaction.
    fn for_each_row<F>(&self, db: Database, mut visit: F) -> Result<()>
    where
        F: FnMut(&[u8], &[u8]) -> Result<()>,
    {
        self.ensure_open()?;

        let txn = self.env.begin_ro_txn()
            .map_err(|e| Error::query(format!("Failed to start read transaction: {}", e)))?;

        let outcome = {
            // Cursor must be dropped before the transaction ends
            let mut cursor = txn.open_ro_cursor(db)
                .map_err(|e| Error::query(format!("Failed to create cursor: {}", e)))?;

            let mut outcome = Ok(());
            for row in cursor.iter() {
                match row {
                    Ok((key, value)) => {
                        if let Err(e) = visit(key, value) {
                            outcome = Err(e);
                            break;
                        }
                    },
                    Err(e) => {
                        outcome = Err(Error::query(format!("Error iterating cursor: {}", e)));
                        break;
                    }
                }
            }
            outcome
        };

        txn.abort();
        self.metrics.increment_reads();
        if outcome.is_err() {
            self.metrics.increment_failed_ops();
        }
        outcome
    }

    /// Highest counts first, ties broken by word ascending. One cursor pass
    /// feeding a bounded heap, so memory stays proportional to `n`.
    pub fn top_n_by_value(&self, n: usize) -> Result<Vec<(String, u64)>> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let mut rows = Vec::new();
        self.for_each_row(self.frequency_db, |key, value| {
            let count = Self::decode_count(key, value)?;
            rows.push((String::from_utf8_lossy(key).into_owned(), count));
            // Keep the working set near n while scanning
            if rows.len() >= n.saturating_mul(2).max(1024) {
                rows = selector::heap_top_n(std::mem::take(&mut rows), n);
            }
            Ok(())
        })?;

        let top = selector::heap_top_n(rows, n);
        debug!("Store top-{} query returned {} rows", n, top.len());
        Ok(top)
    }

    /// Every row of a table as text. Counts are rendered in decimal.
    pub fn scan_all(&self, table: Table) -> Result<Vec<(String, String)>> {
        let mut rows = Vec::new();
        self.for_each_row(self.db_for(table), |key, value| {
            let key_text = String::from_utf8_lossy(key).into_owned();
            let value_text = match table {
                Table::Frequency => Self::decode_count(key, value)?.to_string(),
                Table::Emoticons => String::from_utf8_lossy(value).into_owned(),
            };
            rows.push((key_text, value_text));
            Ok(())
        })?;
        Ok(rows)
    }

    pub fn frequency_table(&self) -> Result<FrequencyTable> {
        let mut table = FrequencyTable::default();
        self.for_each_row(self.frequency_db, |key, value| {
            let count = Self::decode_count(key, value)?;
            table.insert(String::from_utf8_lossy(key).into_owned(), count);
            Ok(())
        })?;
        Ok(table)
    }

    pub fn position_table(&self) -> Result<PositionTable> {
        let mut table = PositionTable::default();
        self.for_each_row(self.emoticon_db, |key, value| {
            let code = String::from_utf8_lossy(key).into_owned();
            let positions = split_positions(&String::from_utf8_lossy(value))?;
            if positions.is_empty() {
                warn!("Emoticon {:?} has an empty position list in the store", code);
                return Ok(());
            }
            table.insert(code, positions);
            Ok(())
        })?;
        Ok(table)
    }

    /// Stored count for one word, if any.
    pub fn get_count(&self, word: &str) -> Result<Option<u64>> {
        self.ensure_open()?;
        let txn = self.env.begin_ro_txn()
            .map_err(|e| Error::query(format!("Failed to start read transaction: {}", e)))?;

        let count = match txn.get(self.frequency_db, &word) {
            Ok(bytes) => Some(Self::decode_count(word.as_bytes(), bytes)?),
            Err(lmdb_rkv::Error::NotFound) => None,
            Err(e) => return Err(Error::query(format!("Failed to read count for {:?}: {}", word, e))),
        };

        txn.abort();
        self.metrics.increment_reads();
        Ok(count)
    }
}
