// src/pipeline/aggregator.rs

use log::{debug, info};

use crate::error::Result;
use crate::pipeline::pool::ChunkAnalysis;
use crate::selector;
use crate::storage::StorageBackend;
use crate::types::{FrequencyTable, PositionTable, ResultPair};

enum Target {
    Memory {
        words: FrequencyTable,
        emoticons: PositionTable,
    },
    Store(Box<dyn StorageBackend>),
}

/// Folds analysed batches into the run's totals, either in memory or in a
/// persistent store. The target is fixed when the aggregator is built.
pub struct Aggregator {
    target: Target,
    absorbed_chunks: u64,
}

impl Aggregator {
    pub fn in_memory() -> Self {
        Self {
            target: Target::Memory {
                words: FrequencyTable::default(),
                emoticons: PositionTable::default(),
            },
            absorbed_chunks: 0,
        }
    }

    pub fn with_store(store: Box<dyn StorageBackend>) -> Self {
        Self {
            target: Target::Store(store),
            absorbed_chunks: 0,
        }
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self.target, Target::Store(_))
    }

    pub fn absorbed_chunks(&self) -> u64 {
        self.absorbed_chunks
    }

    /// Add one batch to the totals. With a store, each distinct word becomes
    /// one upsert-add and each code one positions append, all batched.
    pub fn absorb(&mut self, batch: ChunkAnalysis) -> Result<()> {
        self.absorbed_chunks += batch.chunks;
        match &mut self.target {
            Target::Memory { words, emoticons } => {
                for (word, count) in batch.words {
                    *words.entry(word).or_insert(0) += count;
                }
                for (code, positions) in batch.emoticons {
                    emoticons.entry(code).or_default().extend(positions);
                }
            },
            Target::Store(store) => {
                debug!(
                    "Writing {} words and {} emoticon codes to the store",
                    batch.words.len(),
                    batch.emoticons.len()
                );
                store.upsert_add_batch(&batch.words)?;
                store.append_positions_batch(&batch.emoticons)?;
            },
        }
        Ok(())
    }

    /// Forget everything gathered so far.
    pub fn reset(&mut self) -> Result<()> {
        self.absorbed_chunks = 0;
        match &mut self.target {
            Target::Memory { words, emoticons } => {
                words.clear();
                emoticons.clear();
                Ok(())
            },
            Target::Store(store) => store.clear(),
        }
    }

    /// Make room for an input of `input_size` bytes. A no-op in memory.
    pub fn reserve_for_input(&mut self, input_size: u64) -> Result<()> {
        match &mut self.target {
            Target::Memory { .. } => Ok(()),
            Target::Store(store) => store.reserve_for_input(input_size),
        }
    }

    pub fn top_n(&self, n: usize) -> Result<Vec<(String, u64)>> {
        match &self.target {
            Target::Memory { words, .. } => Ok(selector::top_n(words, n)),
            Target::Store(store) => store.top_n_by_value(n),
        }
    }

    pub fn top_word_pairs(&self, n: usize) -> Result<Vec<ResultPair>> {
        Ok(selector::to_result_pairs(&self.top_n(n)?))
    }

    pub fn emoticon_pairs(&self) -> Result<Vec<ResultPair>> {
        match &self.target {
            Target::Memory { emoticons, .. } => Ok(selector::emoticon_pairs(emoticons)),
            Target::Store(store) => Ok(selector::emoticon_pairs(&store.position_table()?)),
        }
    }

    pub fn frequency_table(&self) -> Result<FrequencyTable> {
        match &self.target {
            Target::Memory { words, .. } => Ok(words.clone()),
            Target::Store(store) => store.frequency_table(),
        }
    }

    pub fn position_table(&self) -> Result<PositionTable> {
        match &self.target {
            Target::Memory { emoticons, .. } => Ok(emoticons.clone()),
            Target::Store(store) => store.position_table(),
        }
    }

    /// Make everything absorbed so far durable. A no-op in memory.
    pub fn flush(&self) -> Result<()> {
        match &self.target {
            Target::Memory { .. } => Ok(()),
            Target::Store(store) => store.sync(),
        }
    }

    pub fn close(&mut self) -> Result<()> {
        if let Target::Store(store) = &mut self.target {
            info!("Closing aggregation store after {} chunks", self.absorbed_chunks);
            store.close()?;
        }
        Ok(())
    }
}
