use ahash::AHashMap;
use serde::{Serialize, Deserialize};

/// Word -> occurrence count.
pub type FrequencyTable = AHashMap<String, u64>;

/// Emoticon code -> absolute 1-based byte offsets.
pub type PositionTable = AHashMap<String, Vec<u64>>;

pub const LABEL_WORD: &str = "Word";
pub const LABEL_CODE: &str = "Code";
pub const LABEL_ID: &str = "Id";

/// One boundary-adjusted slice of the input file, waiting to be analysed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkTask {
    pub text: Vec<u8>,
    /// Absolute position (1-based) of the last byte of this chunk.
    pub end_offset: u64,
    pub length: u64,
}

impl ChunkTask {
    pub fn new(text: Vec<u8>, end_offset: u64) -> Self {
        let length = text.len() as u64;
        Self { text, end_offset, length }
    }

    /// Absolute 0-based offset of the first byte.
    pub fn start_offset(&self) -> u64 {
        self.end_offset - self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

/// A `(label, value)` row. Rows always travel in couples:
/// `Word`/`Id` for frequencies and `Code`/`Id` for emoticon positions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResultPair {
    pub label: String,
    pub value: String,
}

impl ResultPair {
    pub fn new<L: Into<String>, V: Into<String>>(label: L, value: V) -> Self {
        Self { label: label.into(), value: value.into() }
    }

    pub fn couple(label: &str, key: &str, id: impl ToString) -> [ResultPair; 2] {
        [ResultPair::new(label, key), ResultPair::new(LABEL_ID, id.to_string())]
    }
}

/// Counters describing one completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub chunks: u64,
    pub bytes: u64,
    pub words: u64,
    pub emoticons: u64,
}
