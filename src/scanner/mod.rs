//! Stateless text scanning used by the analysis workers: word tokenization and
//! emoticon matching. Both operate on raw bytes so that offsets stay byte
//! offsets into the source file even when the text is not valid UTF-8.

pub mod emoticon;

use std::borrow::Cow;

pub use self::emoticon::{find_emoticons, EmoticonMatch, EMOTICON_CODES};

/// Bytes that separate words. Carriage return is intentionally absent.
pub const DELIMITERS: &[u8] = b"\t\n,.;`\"?<>/+-*!@#$%^&~({[)}]: ";

const fn build_delimiter_table() -> [bool; 256] {
    let mut table = [false; 256];
    let mut i = 0;
    while i < DELIMITERS.len() {
        table[DELIMITERS[i] as usize] = true;
        i += 1;
    }
    table
}

static DELIMITER_TABLE: [bool; 256] = build_delimiter_table();

#[inline]
pub fn is_delimiter(byte: u8) -> bool {
    DELIMITER_TABLE[byte as usize]
}

/// Split `text` into words. Runs of delimiters never produce empty words and
/// case is preserved.
pub fn tokenize(text: &[u8]) -> impl Iterator<Item = Cow<'_, str>> + '_ {
    text.split(|&b| is_delimiter(b))
        .filter(|word| !word.is_empty())
        .map(String::from_utf8_lossy)
}
