// src/pipeline/pool.rs

use crossbeam_channel::Sender;
use crossbeam_utils::thread;
use log::{debug, trace};

use crate::error::{Error, Result};
use crate::pipeline::queue::TaskQueue;
use crate::scanner::{find_emoticons, tokenize};
use crate::types::{ChunkTask, FrequencyTable, PositionTable};

/// Word counts and emoticon positions for one or more chunks.
#[derive(Debug, Clone, Default)]
pub struct ChunkAnalysis {
    pub words: FrequencyTable,
    pub emoticons: PositionTable,
    pub chunks: u64,
    pub bytes: u64,
}

impl ChunkAnalysis {
    pub fn is_empty(&self) -> bool {
        self.chunks == 0
    }

    pub fn word_count(&self) -> u64 {
        self.words.values().sum()
    }

    pub fn emoticon_count(&self) -> u64 {
        self.emoticons.values().map(|p| p.len() as u64).sum()
    }

    /// Scan one chunk into these tables. Empty tasks are ignored.
    pub fn record(&mut self, task: &ChunkTask) {
        if task.is_empty() {
            return;
        }
        for word in tokenize(&task.text) {
            match self.words.get_mut(&*word) {
                Some(count) => *count += 1,
                None => {
                    self.words.insert(word.into_owned(), 1);
                },
            }
        }
        for found in find_emoticons(&task.text, task.end_offset, task.length) {
            self.emoticons
                .entry(found.code.to_string())
                .or_default()
                .push(found.position);
        }
        self.chunks += 1;
        self.bytes += task.length;
    }

    /// Additive merge: counts are summed, position lists concatenated.
    pub fn merge(&mut self, other: ChunkAnalysis) {
        if self.words.is_empty() {
            self.words = other.words;
        } else {
            for (word, count) in other.words {
                *self.words.entry(word).or_insert(0) += count;
            }
        }
        for (code, positions) in other.emoticons {
            self.emoticons.entry(code).or_default().extend(positions);
        }
        self.chunks += other.chunks;
        self.bytes += other.bytes;
    }
}

/// Analyse a single chunk.
pub fn analyze_task(task: &ChunkTask) -> ChunkAnalysis {
    let mut analysis = ChunkAnalysis::default();
    analysis.record(task);
    analysis
}

/// A fixed number of scoped workers draining a shared task queue.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisPool {
    workers: usize,
}

impl AnalysisPool {
    pub fn new(workers: usize) -> Self {
        Self { workers: workers.max(1) }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Drain every task currently in `queue` and return the merged tables.
    ///
    /// Each worker keeps private tables; they are merged on this thread after
    /// all workers have joined. The queue is left empty and reusable.
    pub fn run_batch(&self, queue: &TaskQueue) -> Result<ChunkAnalysis> {
        let pending = queue.size();
        if pending == 0 {
            return Ok(ChunkAnalysis::default());
        }
        let workers = self.workers.min(pending);
        debug!("Draining {} tasks with {} workers", pending, workers);

        let partials = thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|id| {
                    scope.spawn(move |_| {
                        let mut local = ChunkAnalysis::default();
                        while let Some(task) = queue.pop() {
                            trace!("Worker {} took chunk ending at {}", id, task.end_offset);
                            local.record(&task);
                        }
                        local
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| {
                    handle
                        .join()
                        .map_err(|_| Error::worker("analysis worker panicked"))
                })
                .collect::<Result<Vec<_>>>()
        })
        .map_err(|_| Error::worker("analysis pool panicked"))??;

        let mut merged = ChunkAnalysis::default();
        for partial in partials {
            merged.merge(partial);
        }
        Ok(merged)
    }
}

/// Streaming worker body: take tasks until the queue is closed and drained,
/// sending one result per chunk. Stops early once the receiver is gone.
pub fn stream_worker(id: usize, queue: &TaskQueue, results: &Sender<ChunkAnalysis>) -> u64 {
    let mut processed = 0;
    while let Some(task) = queue.pop_wait() {
        if task.is_empty() {
            continue;
        }
        if results.send(analyze_task(&task)).is_err() {
            debug!("Worker {} stopping, aggregator has gone away", id);
            break;
        }
        processed += 1;
    }
    trace!("Worker {} finished after {} chunks", id, processed);
    processed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(text: &str, end_offset: u64) -> ChunkTask {
        ChunkTask::new(text.as_bytes().to_vec(), end_offset)
    }

    #[test]
    fn test_analyze_example_chunk() {
        let analysis = analyze_task(&task("a a b :) c c c :-)", 18));
        assert_eq!(analysis.words.get("a"), Some(&2));
        assert_eq!(analysis.words.get("b"), Some(&1));
        assert_eq!(analysis.words.get("c"), Some(&3));
        assert_eq!(analysis.words.len(), 3);
        assert_eq!(analysis.emoticons.get(":)"), Some(&vec![7]));
        assert_eq!(analysis.emoticons.get(":-)"), Some(&vec![16]));
        assert_eq!(analysis.word_count(), 6);
        assert_eq!(analysis.emoticon_count(), 2);
    }

    #[test]
    fn test_merge_is_additive() {
        let mut left = analyze_task(&task("x y :)", 6));
        let right = analyze_task(&task("y z :)", 12));
        left.merge(right);
        assert_eq!(left.words.get("y"), Some(&2));
        assert_eq!(left.words.get("z"), Some(&1));
        assert_eq!(left.emoticons.get(":)"), Some(&vec![5, 11]));
        assert_eq!(left.chunks, 2);
        assert_eq!(left.bytes, 12);
    }

    #[test]
    fn test_run_batch_drains_queue_and_matches_sequential() {
        let texts = ["one two ", "two three ", "three three :( ", "", "four "];
        let queue = TaskQueue::new();
        let mut sequential = ChunkAnalysis::default();
        let mut offset = 0;
        for text in texts {
            offset += text.len() as u64;
            let t = task(text, offset);
            sequential.record(&t);
            queue.push(t).expect("queue is open");
        }

        let pool = AnalysisPool::new(3);
        let batch = pool.run_batch(&queue).expect("batch");
        assert!(queue.is_empty());
        assert_eq!(*batch.words, *sequential.words);
        assert_eq!(*batch.emoticons, *sequential.emoticons);
        assert_eq!(batch.chunks, 4);
        assert_eq!(batch.bytes, sequential.bytes);

        // Reusable after draining
        queue.push(task("again ", offset + 6)).expect("queue is open");
        let next = pool.run_batch(&queue).expect("second batch");
        assert_eq!(next.words.get("again"), Some(&1));
    }

    #[test]
    fn test_empty_task_is_not_counted() {
        let analysis = analyze_task(&task("", 10));
        assert!(analysis.is_empty());
        assert_eq!(analysis.bytes, 0);
    }

    #[test]
    fn test_empty_queue_does_no_work() {
        let pool = AnalysisPool::new(4);
        let result = pool.run_batch(&TaskQueue::new()).expect("batch");
        assert!(result.is_empty());
    }

    #[test]
    fn test_stream_worker_sends_one_result_per_chunk() {
        let queue = TaskQueue::new();
        queue.push(task("a b ", 4)).expect("queue is open");
        queue.push(task("", 4)).expect("queue is open");
        queue.push(task("c :] ", 9)).expect("queue is open");
        queue.close();

        let (tx, rx) = crossbeam_channel::unbounded();
        assert_eq!(stream_worker(0, &queue, &tx), 2);
        drop(tx);
        let results: Vec<ChunkAnalysis> = rx.iter().collect();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].emoticons.get(":]"), Some(&vec![7]));
    }
}
