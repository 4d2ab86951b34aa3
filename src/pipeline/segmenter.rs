// src/pipeline/segmenter.rs

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use log::{debug, trace};

use crate::error::{Error, Result};
use crate::types::ChunkTask;

/// Whitespace that also separates words. `\r` and form feed are whitespace
/// but not delimiters, so a cut there would split a token.
#[inline]
pub fn is_boundary(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n')
}

/// Reads a file in fixed-size windows and yields chunks that end on a
/// separating whitespace byte (space, tab or newline).
///
/// Every byte of the file lands in exactly one chunk. When a window would cut a
/// word, the chunk is shortened to end just after the last whitespace byte in
/// the window and the cursor moves back to that point, so the cut-off tail is
/// read again as the head of the next chunk. A window with no whitespace at all
/// (while more file remains) is an error rather than a silently split word.
pub struct ChunkSegmenter {
    file: File,
    path: PathBuf,
    file_len: u64,
    chunk_size: usize,
    cursor: u64,
    buffer: Vec<u8>,
    failed: bool,
}

impl ChunkSegmenter {
    pub fn open<P: AsRef<Path>>(path: P, chunk_size: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if chunk_size == 0 {
            return Err(Error::config("chunk_size must be greater than 0"));
        }
        if !path.is_file() {
            return Err(Error::InputNotFound(path));
        }

        let file = File::open(&path)?;
        let file_len = file.metadata()?.len();

        // Clamp the window to the file itself.
        let effective = if file_len > 0 && chunk_size as u64 > file_len {
            file_len as usize
        } else {
            chunk_size
        };

        debug!(
            "Segmenting {:?} ({} bytes) with chunk size {} (requested {})",
            path, file_len, effective, chunk_size
        );

        Ok(Self {
            file,
            path,
            file_len,
            chunk_size: effective,
            cursor: 0,
            buffer: Vec::with_capacity(effective + 1),
            failed: false,
        })
    }

    pub fn file_len(&self) -> u64 {
        self.file_len
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Upper bound on the number of chunks, for progress reporting.
    pub fn estimated_chunks(&self) -> u64 {
        if self.file_len == 0 {
            0
        } else {
            (self.file_len + self.chunk_size as u64 - 1) / self.chunk_size as u64
        }
    }

    fn next_chunk(&mut self) -> Result<Option<ChunkTask>> {
        if self.cursor >= self.file_len {
            return Ok(None);
        }

        // Read the window plus one byte of lookahead.
        self.buffer.clear();
        self.file.seek(SeekFrom::Start(self.cursor))?;
        (&mut self.file)
            .take(self.chunk_size as u64 + 1)
            .read_to_end(&mut self.buffer)?;

        if self.buffer.is_empty() {
            // The file shrank underneath us.
            return Ok(None);
        }

        let window = self.buffer.len().min(self.chunk_size);
        let more_remaining = self.buffer.len() > self.chunk_size;

        let chunk_len = if more_remaining && !is_boundary(self.buffer[self.chunk_size]) {
            match self.buffer[..window].iter().rposition(|&b| is_boundary(b)) {
                Some(ws) => {
                    trace!(
                        "Moved chunk boundary at offset {} back by {} bytes",
                        self.cursor + window as u64,
                        window - (ws + 1)
                    );
                    ws + 1
                },
                None => {
                    return Err(Error::ChunkBoundaryUnresolvable {
                        offset: self.cursor,
                        chunk_size: self.chunk_size,
                    });
                },
            }
        } else {
            window
        };

        self.buffer.truncate(chunk_len);
        self.cursor += chunk_len as u64;

        let task = ChunkTask {
            text: std::mem::replace(&mut self.buffer, Vec::with_capacity(self.chunk_size + 1)),
            end_offset: self.cursor,
            length: chunk_len as u64,
        };
        trace!("Chunk {}..{} ({} bytes)", task.start_offset(), task.end_offset, task.length);
        Ok(Some(task))
    }
}

impl Iterator for ChunkSegmenter {
    type Item = Result<ChunkTask>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            match self.next_chunk() {
                Ok(Some(task)) if task.is_empty() => continue,
                Ok(Some(task)) => return Some(Ok(task)),
                Ok(None) => return None,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(content).expect("write temp file");
        file.flush().expect("flush temp file");
        file
    }

    fn chunks(content: &[u8], chunk_size: usize) -> Result<Vec<ChunkTask>> {
        let file = write_temp(content);
        ChunkSegmenter::open(file.path(), chunk_size)?.collect()
    }

    #[test]
    fn test_empty_file_yields_nothing() {
        assert!(chunks(b"", 64).expect("segmenting").is_empty());
    }

    #[test]
    fn test_small_file_is_one_chunk() {
        let tasks = chunks(b"a a b :) c c c :-)", 64).expect("segmenting");
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].end_offset, 18);
        assert_eq!(tasks[0].length, 18);
        assert_eq!(tasks[0].start_offset(), 0);
    }

    #[test]
    fn test_boundaries_land_after_whitespace() {
        let tasks = chunks(b"alpha beta gamma delta", 8).expect("segmenting");
        let texts: Vec<&[u8]> = tasks.iter().map(|t| t.text.as_slice()).collect();
        assert_eq!(texts, vec![&b"alpha "[..], b"beta ", b"gamma ", b"delta"]);
        assert_eq!(tasks[1].start_offset(), 6);
        assert_eq!(tasks[1].end_offset, 11);
        assert_eq!(tasks.last().map(|t| t.end_offset), Some(22));
    }

    #[test]
    fn test_window_ending_before_whitespace_is_kept_whole() {
        let tasks = chunks(b"abcd efgh", 4).expect("segmenting");
        let texts: Vec<&[u8]> = tasks.iter().map(|t| t.text.as_slice()).collect();
        assert_eq!(texts, vec![&b"abcd"[..], b" ", b"efgh"]);
    }

    #[test]
    fn test_exact_multiple_has_no_empty_chunk() {
        let tasks = chunks(b"ab cd ef", 3).expect("segmenting");
        assert!(tasks.iter().all(|t| t.length > 0));
        let joined: Vec<u8> = tasks.iter().flat_map(|t| t.text.clone()).collect();
        assert_eq!(joined, b"ab cd ef");
    }

    #[test]
    fn test_reconstructs_file_for_every_workable_chunk_size() {
        let content = b"The quick brown fox :-) jumps\tover the lazy dog.\nAnd again :( the end ";
        let crlf = b"one two\r\nthree four\r\n\x0Cfive six\r\n";
        for content in [&content[..], &crlf[..]] {
            let longest_run = content
                .split(|&b| is_boundary(b))
                .map(|w| w.len())
                .max()
                .unwrap_or(0);
            for size in longest_run.max(1)..=content.len() + 3 {
                let tasks = chunks(content, size).expect("segmenting");
                let joined: Vec<u8> = tasks.iter().flat_map(|t| t.text.clone()).collect();
                assert_eq!(joined, content.to_vec(), "chunk size {}", size);

                let mut expected_start = 0;
                for task in &tasks {
                    assert_eq!(task.start_offset(), expected_start, "chunk size {}", size);
                    expected_start = task.end_offset;
                }
                assert_eq!(expected_start, content.len() as u64);
            }
        }
    }

    #[test]
    fn test_carriage_return_is_not_a_boundary() {
        let tasks = chunks(b"ab\r\ncd\r\n", 3).expect("segmenting");
        let texts: Vec<&[u8]> = tasks.iter().map(|t| t.text.as_slice()).collect();
        assert_eq!(texts, vec![&b"ab\r"[..], b"\n", b"cd\r", b"\n"]);
        for task in &tasks {
            assert_ne!(task.text.first(), Some(&b'\r'));
        }

        assert!(matches!(
            chunks(b"ab\r\ncd\r\n", 2),
            Err(Error::ChunkBoundaryUnresolvable { offset: 0, chunk_size: 2 })
        ));
    }

    #[test]
    fn test_unsplittable_window_fails_fast() {
        let result = chunks(b"abcdefghij klm", 4);
        assert!(matches!(
            result,
            Err(Error::ChunkBoundaryUnresolvable { offset: 0, chunk_size: 4 })
        ));
    }

    #[test]
    fn test_missing_file_is_input_not_found() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("nope.txt");
        assert!(matches!(
            ChunkSegmenter::open(&missing, 16),
            Err(Error::InputNotFound(p)) if p == missing
        ));
    }

    #[test]
    fn test_error_ends_iteration() {
        let file = write_temp(b"abcdefghij klm");
        let mut segmenter = ChunkSegmenter::open(file.path(), 4).expect("open");
        assert!(matches!(segmenter.next(), Some(Err(_))));
        assert!(segmenter.next().is_none());
    }
}
