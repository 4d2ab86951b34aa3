use lazy_static::lazy_static;
use regex::bytes::Regex;

/// The closed set of recognised emoticons.
pub const EMOTICON_CODES: [&str; 12] = [
    ":)", ":-)", ":]", ":-]", ":}", ":-}",
    ":(", ":-(", ":[", ":-[", ":{", ":-{",
];

lazy_static! {
    static ref EMOTICON_PATTERN: Regex = Regex::new(r":-?[)}\](\{\[]")
        .expect("emoticon pattern is valid");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmoticonMatch {
    pub code: &'static str,
    /// Absolute 1-based byte offset in the source file.
    pub position: u64,
}

fn canonical_code(bytes: &[u8]) -> Option<&'static str> {
    EMOTICON_CODES.iter().copied().find(|code| code.as_bytes() == bytes)
}

/// Find every emoticon in a chunk, leftmost-first and non-overlapping.
///
/// `end_offset` and `length` describe where the chunk sits in the file; a match
/// at chunk offset `p` lands at `end_offset - length + p + 1`.
pub fn find_emoticons(text: &[u8], end_offset: u64, length: u64) -> Vec<EmoticonMatch> {
    let base = end_offset.saturating_sub(length);
    EMOTICON_PATTERN
        .find_iter(text)
        .filter_map(|m| {
            canonical_code(m.as_bytes()).map(|code| EmoticonMatch {
                code,
                position: base + m.start() as u64 + 1,
            })
        })
        .collect()
}
