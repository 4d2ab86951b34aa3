// src/pipeline/mod.rs

pub mod queue;
pub mod segmenter;
pub mod pool;
pub mod aggregator;

use std::path::Path;
use std::time::Instant;
use crossbeam_channel::Sender;
use crossbeam_utils::thread;
use indicatif::ProgressBar;
use log::{debug, info, warn};

use crate::config::subsystems::{ExecutionMode, PipelineConfig};
use crate::error::{Error, Result};
use crate::types::{ChunkTask, RunSummary};

pub use self::aggregator::Aggregator;
pub use self::pool::{analyze_task, AnalysisPool, ChunkAnalysis};
pub use self::queue::TaskQueue;
pub use self::segmenter::ChunkSegmenter;

/// Drives one input file through segmentation, analysis and aggregation.
pub struct Pipeline {
    chunk_size: usize,
    workers: usize,
    queue_capacity: usize,
    batch_chunks: usize,
    mode: ExecutionMode,
    progress: Option<ProgressBar>,
}

fn tally(summary: &mut RunSummary, analysis: &ChunkAnalysis) {
    summary.chunks += analysis.chunks;
    summary.bytes += analysis.bytes;
    summary.words += analysis.word_count();
    summary.emoticons += analysis.emoticon_count();
}

impl Pipeline {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            workers: config.effective_workers(),
            queue_capacity: config.queue_capacity,
            batch_chunks: config.effective_batch_chunks(),
            mode: config.mode,
            progress: None,
        }
    }

    /// Report progress in bytes on `bar`.
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    fn advance(&self, bytes: u64) {
        if let Some(bar) = &self.progress {
            bar.inc(bytes);
        }
    }

    /// Process `input` completely, folding every chunk into `aggregator`.
    pub fn run(&self, input: &Path, aggregator: &mut Aggregator) -> Result<RunSummary> {
        let segmenter = ChunkSegmenter::open(input, self.chunk_size)?;
        if let Some(bar) = &self.progress {
            bar.set_length(segmenter.file_len());
            bar.set_position(0);
        }

        info!(
            "Processing {:?} ({} bytes) in {} mode with {} workers, chunk size {}",
            input,
            segmenter.file_len(),
            self.mode.as_str(),
            self.workers,
            segmenter.chunk_size()
        );

        let start = Instant::now();
        let summary = match self.mode {
            ExecutionMode::Batch => self.run_batches(segmenter, aggregator)?,
            ExecutionMode::Streaming => self.run_streaming(segmenter, pool::stream_worker, aggregator)?,
        };

        info!(
            "Processed {} chunks ({} bytes): {} words, {} emoticons in {:.2?}",
            summary.chunks,
            summary.bytes,
            summary.words,
            summary.emoticons,
            start.elapsed()
        );
        Ok(summary)
    }

    /// Read up to `batch_chunks` tasks, drain them with the pool, merge, repeat.
    fn run_batches(&self, mut segmenter: ChunkSegmenter, aggregator: &mut Aggregator) -> Result<RunSummary> {
        let queue = TaskQueue::new();
        let pool = AnalysisPool::new(self.workers);
        let mut summary = RunSummary::default();
        let mut batch_number = 0u64;

        loop {
            let mut queued = 0;
            while queued < self.batch_chunks {
                match segmenter.next() {
                    Some(task) => {
                        queue.push(task?)
                            .map_err(|_| Error::worker("task queue closed while filling a batch"))?;
                        queued += 1;
                    },
                    None => break,
                }
            }
            if queued == 0 {
                break;
            }

            batch_number += 1;
            let analysis = pool.run_batch(&queue)?;
            debug!("Batch {}: {} chunks, {} distinct words", batch_number, analysis.chunks, analysis.words.len());
            tally(&mut summary, &analysis);
            self.advance(analysis.bytes);
            aggregator.absorb(analysis)?;
        }

        Ok(summary)
    }

    /// Reader thread -> bounded task queue -> worker pool -> result channel ->
    /// aggregator on the calling thread. `worker` is the body each pool thread
    /// runs until the queue is closed and drained.
    fn run_streaming<I, W>(&self, tasks: I, worker: W, aggregator: &mut Aggregator) -> Result<RunSummary>
    where
        I: IntoIterator<Item = Result<ChunkTask>>,
        I::IntoIter: Send,
        W: Fn(usize, &TaskQueue, &Sender<ChunkAnalysis>) -> u64 + Sync,
    {
        let tasks = tasks.into_iter();
        let queue: TaskQueue = TaskQueue::bounded(self.queue_capacity);
        let result_capacity = if self.queue_capacity == 0 {
            self.workers * 4
        } else {
            self.queue_capacity
        };
        let (tx, rx) = crossbeam_channel::bounded::<ChunkAnalysis>(result_capacity.max(1));
        let workers = self.workers;
        let worker = &worker;

        let outcome = thread::scope(|scope| -> Result<RunSummary> {
            let queue = &queue;

            let reader = scope.spawn(move |_| -> Result<u64> {
                let mut produced = 0u64;
                for task in tasks {
                    let task = match task {
                        Ok(task) => task,
                        Err(e) => {
                            queue.close();
                            return Err(e);
                        },
                    };
                    if queue.push(task).is_err() {
                        debug!("Task queue closed, reader stopping after {} chunks", produced);
                        break;
                    }
                    produced += 1;
                }
                queue.close();
                Ok(produced)
            });

            for id in 0..workers {
                let tx = tx.clone();
                scope.spawn(move |_| worker(id, queue, &tx));
            }
            drop(tx);

            let mut summary = RunSummary::default();
            let mut failure = None;
            for analysis in rx.iter() {
                tally(&mut summary, &analysis);
                self.advance(analysis.bytes);
                if let Err(e) = aggregator.absorb(analysis) {
                    warn!("Aggregation failed, stopping the pipeline: {}", e);
                    failure = Some(e);
                    break;
                }
            }
            // Unblocks the reader if the workers stopped early, and workers
            // still blocked on a full channel see the disconnect and exit.
            queue.close();
            drop(rx);

            let produced = reader
                .join()
                .map_err(|_| Error::worker("chunk reader panicked"))??;
            if let Some(e) = failure {
                return Err(e);
            }
            if produced != summary.chunks {
                return Err(Error::worker(format!(
                    "{} chunks were read but {} were analysed",
                    produced, summary.chunks
                )));
            }
            Ok(summary)
        })
        .map_err(|_| Error::worker("analysis worker panicked"))?;

        outcome
    }
}
