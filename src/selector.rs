//! Top-N word selection.
//!
//! Word counts are small integers bounded by the file size, so the default
//! path is a counting sort: one bucket per observed frequency, walked from the
//! highest down. When the maximum count dwarfs the number of distinct words the
//! bucket array would be mostly empty, and a bounded heap is used instead.
//! Both paths order by count descending, then word ascending.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use log::trace;

use crate::types::{FrequencyTable, PositionTable, ResultPair, LABEL_CODE, LABEL_WORD};

/// Extra buckets tolerated before switching to the heap.
const BUCKET_SLACK: u64 = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Ranked {
    word: String,
    count: u64,
}

impl Ord for Ranked {
    // Greater means ranked higher.
    fn cmp(&self, other: &Self) -> Ordering {
        self.count
            .cmp(&other.count)
            .then_with(|| other.word.cmp(&self.word))
    }
}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn outranks(count: u64, word: &str, other: &Ranked) -> bool {
    count > other.count || (count == other.count && word < other.word.as_str())
}

/// The `n` most frequent words, picking the bucket or heap strategy by shape.
pub fn top_n(table: &FrequencyTable, n: usize) -> Vec<(String, u64)> {
    if n == 0 || table.is_empty() {
        return Vec::new();
    }

    let max_count = table.values().copied().max().unwrap_or(0);
    let distinct = table.len() as u64;
    if max_count > distinct.saturating_mul(4).saturating_add(BUCKET_SLACK) {
        trace!("Max count {} over {} words, using heap selection", max_count, distinct);
        heap_top_n(table.iter().map(|(w, &c)| (w.as_str(), c)), n)
    } else {
        bucket_top_n(table, n)
    }
}

/// Counting sort with one bucket per frequency up to the observed maximum.
pub fn bucket_top_n(table: &FrequencyTable, n: usize) -> Vec<(String, u64)> {
    if n == 0 || table.is_empty() {
        return Vec::new();
    }

    let max_count = table.values().copied().max().unwrap_or(0) as usize;
    let mut buckets: Vec<Vec<&str>> = vec![Vec::new(); max_count + 1];
    for (word, &count) in table {
        buckets[count as usize].push(word.as_str());
    }

    let wanted = n.min(table.len());
    let mut selected = Vec::with_capacity(wanted);
    for (count, bucket) in buckets.iter_mut().enumerate().rev() {
        if selected.len() == wanted {
            break;
        }
        if bucket.is_empty() {
            continue;
        }
        bucket.sort_unstable();
        let take = (wanted - selected.len()).min(bucket.len());
        selected.extend(bucket[..take].iter().map(|w| (w.to_string(), count as u64)));
    }
    selected
}

/// Bounded min-heap selection over any stream of `(word, count)`.
/// Only words that make it into the heap are allocated.
pub fn heap_top_n<S, I>(entries: I, n: usize) -> Vec<(String, u64)>
where
    S: AsRef<str> + Into<String>,
    I: IntoIterator<Item = (S, u64)>,
{
    if n == 0 {
        return Vec::new();
    }

    let mut heap: BinaryHeap<Reverse<Ranked>> = BinaryHeap::with_capacity(n + 1);
    for (word, count) in entries {
        if heap.len() == n {
            match heap.peek() {
                Some(Reverse(worst)) if !outranks(count, word.as_ref(), worst) => continue,
                _ => {},
            }
        }
        heap.push(Reverse(Ranked { word: word.into(), count }));
        if heap.len() > n {
            heap.pop();
        }
    }

    heap.into_sorted_vec()
        .into_iter()
        .map(|Reverse(ranked)| (ranked.word, ranked.count))
        .collect()
}

/// `("Word", w), ("Id", count)` couples in rank order.
pub fn to_result_pairs(ranked: &[(String, u64)]) -> Vec<ResultPair> {
    ranked
        .iter()
        .flat_map(|(word, count)| ResultPair::couple(LABEL_WORD, word, count))
        .collect()
}

/// `("Code", c), ("Id", position)` couples, one per position. Codes are sorted
/// and each code's positions ascend.
pub fn emoticon_pairs(table: &PositionTable) -> Vec<ResultPair> {
    let mut codes: Vec<(&String, &Vec<u64>)> = table.iter().collect();
    codes.sort_by(|a, b| a.0.cmp(b.0));

    let mut pairs = Vec::new();
    for (code, positions) in codes {
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        for position in sorted {
            pairs.extend(ResultPair::couple(LABEL_CODE, code, position));
        }
    }
    pairs
}
