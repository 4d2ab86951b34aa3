// src/engine.rs

use std::fs;
use std::path::{Path, PathBuf};
use indicatif::ProgressBar;
use log::{debug, info};

use crate::config::WordstatConfig;
use crate::error::{Error, Result};
use crate::pipeline::{Aggregator, Pipeline};
use crate::report::Report;
use crate::storage::create_storage;
use crate::types::{FrequencyTable, PositionTable, ResultPair, RunSummary};

fn existing_file(path: &Path) -> Result<PathBuf> {
    if path.is_file() {
        Ok(path.to_path_buf())
    } else {
        Err(Error::InputNotFound(path.to_path_buf()))
    }
}

/// Word and emoticon statistics for one input file.
///
/// Holds the configuration, the current input path and the aggregation target
/// (memory or store). Each `run` processes the whole input; results are read
/// back through the query methods.
pub struct WordStats {
    config: WordstatConfig,
    input_path: PathBuf,
    aggregator: Aggregator,
    runs: u64,
}

impl WordStats {
    /// Check the input exists and open the store when one is configured.
    pub fn new(config: WordstatConfig) -> Result<Self> {
        let input_path = match &config.files.input_path {
            Some(path) => existing_file(path)?,
            None => return Err(Error::config("No input file path configured")),
        };
        config.validate()?;

        let aggregator = match &config.storage.db_path {
            Some(db_path) => {
                let file_size = fs::metadata(&input_path)?.len();
                let store = create_storage(db_path, &config.storage, Some(file_size))?;
                info!("Aggregating into store at {:?}", db_path);
                debug!("{}", config.storage.describe());
                Aggregator::with_store(Box::new(store))
            },
            None => Aggregator::in_memory(),
        };

        Ok(Self {
            config,
            input_path,
            aggregator,
            runs: 0,
        })
    }

    /// Point the engine at another input. A missing file is rejected and the
    /// previous path is kept.
    pub fn set_input_path<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.input_path = existing_file(path.as_ref())?;
        debug!("Input re-targeted to {:?}", self.input_path);
        Ok(())
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn config(&self) -> &WordstatConfig {
        &self.config
    }

    pub fn is_persistent(&self) -> bool {
        self.aggregator.is_persistent()
    }

    /// Completed runs since the engine was built.
    pub fn runs(&self) -> u64 {
        self.runs
    }

    pub fn run(&mut self) -> Result<RunSummary> {
        self.run_with_progress(None)
    }

    /// Process the current input from scratch. In-memory tables always start
    /// empty, even after a failed run; a store is only reset when
    /// `keep_existing` is off.
    pub fn run_with_progress(&mut self, progress: Option<ProgressBar>) -> Result<RunSummary> {
        // The file may have disappeared since it was configured.
        existing_file(&self.input_path)?;
        let input_size = fs::metadata(&self.input_path)?.len();

        let keep = self.aggregator.is_persistent() && self.config.storage.keep_existing;
        if !keep {
            if self.aggregator.absorbed_chunks() > 0 {
                debug!("Discarding {} chunks from earlier runs", self.aggregator.absorbed_chunks());
            }
            self.aggregator.reset()?;
        }
        self.aggregator.reserve_for_input(input_size)?;

        let mut pipeline = Pipeline::new(&self.config.pipeline);
        if let Some(bar) = progress {
            pipeline = pipeline.with_progress(bar);
        }

        let summary = pipeline.run(&self.input_path, &mut self.aggregator)?;
        self.aggregator.flush()?;
        self.runs += 1;
        Ok(summary)
    }

    /// The `n` most frequent words, highest first.
    pub fn top_n(&self, n: usize) -> Result<Vec<(String, u64)>> {
        self.aggregator.top_n(n)
    }

    /// `("Word", w), ("Id", f)` couples for the `n` most frequent words.
    pub fn top_words(&self, n: usize) -> Result<Vec<ResultPair>> {
        self.aggregator.top_word_pairs(n)
    }

    /// `("Code", c), ("Id", p)` couples for every emoticon occurrence.
    pub fn emoticons(&self) -> Result<Vec<ResultPair>> {
        self.aggregator.emoticon_pairs()
    }

    pub fn frequency_table(&self) -> Result<FrequencyTable> {
        self.aggregator.frequency_table()
    }

    pub fn position_table(&self) -> Result<PositionTable> {
        self.aggregator.position_table()
    }

    pub fn report(&self, n: usize) -> Result<Report> {
        Report::from_pairs(&self.top_words(n)?, &self.emoticons()?)
    }

    pub fn close(&mut self) -> Result<()> {
        self.aggregator.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn input(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(content.as_bytes()).expect("write");
        file.flush().expect("flush");
        file
    }

    fn config_for(path: &Path) -> WordstatConfig {
        let mut config = WordstatConfig::default();
        config.files.input_path = Some(path.to_path_buf());
        config.pipeline.worker_count = 2;
        config
    }

    #[test]
    fn test_missing_input_is_rejected() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("absent.txt");
        assert!(matches!(
            WordStats::new(config_for(&missing)),
            Err(Error::InputNotFound(_))
        ));
        assert!(matches!(WordStats::new(WordstatConfig::default()), Err(Error::Config(_))));
    }

    #[test]
    fn test_example_run() {
        let file = input("a a b :) c c c :-)");
        let mut stats = WordStats::new(config_for(file.path())).expect("engine");
        let summary = stats.run().expect("run");
        assert_eq!(summary.words, 6);
        assert_eq!(summary.emoticons, 2);

        assert_eq!(
            stats.top_words(2).expect("top"),
            vec![
                ResultPair::new("Word", "c"),
                ResultPair::new("Id", "3"),
                ResultPair::new("Word", "a"),
                ResultPair::new("Id", "2"),
            ]
        );
        assert_eq!(
            stats.emoticons().expect("emoticons"),
            vec![
                ResultPair::new("Code", ":)"),
                ResultPair::new("Id", "7"),
                ResultPair::new("Code", ":-)"),
                ResultPair::new("Id", "16"),
            ]
        );
    }

    #[test]
    fn test_rerun_does_not_double_count_in_memory() {
        let file = input("x y x");
        let mut stats = WordStats::new(config_for(file.path())).expect("engine");
        stats.run().expect("first run");
        stats.run().expect("second run");
        assert_eq!(stats.frequency_table().expect("table").get("x"), Some(&2));
    }

    #[test]
    fn test_retarget_input() {
        let first = input("one one");
        let second = input("two");
        let mut stats = WordStats::new(config_for(first.path())).expect("engine");

        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("gone.txt");
        assert!(matches!(stats.set_input_path(&missing), Err(Error::InputNotFound(_))));
        assert_eq!(stats.input_path(), first.path());

        stats.set_input_path(second.path()).expect("retarget");
        stats.run().expect("run");
        assert_eq!(stats.top_n(5).expect("top"), vec![("two".to_string(), 1)]);
    }

    #[test]
    fn test_report_from_run() {
        let file = input(":-) word");
        let mut stats = WordStats::new(config_for(file.path())).expect("engine");
        stats.run().expect("run");
        let report = stats.report(10).expect("report");
        assert_eq!(report.word_count(), 1);
        assert_eq!(report.smiley_count(), 1);
    }

    #[test]
    fn test_failed_run_leaves_nothing_behind() {
        let broken = input("aa bb cc zzzzzzzzzzzz tail");
        let clean = input("aa");
        let mut config = config_for(broken.path());
        config.pipeline.mode = crate::config::subsystems::ExecutionMode::Batch;
        config.pipeline.chunk_size = 6;
        config.pipeline.batch_chunks = 1;

        let mut stats = WordStats::new(config).expect("engine");
        assert!(matches!(
            stats.run(),
            Err(Error::ChunkBoundaryUnresolvable { offset: 9, chunk_size: 6 })
        ));
        assert_eq!(stats.runs(), 0);

        stats.set_input_path(clean.path()).expect("retarget");
        stats.run().expect("clean run");
        let table = stats.frequency_table().expect("table");
        assert_eq!(table.get("aa"), Some(&1));
        assert_eq!(table.len(), 1);
        assert_eq!(stats.runs(), 1);
    }

    #[test]
    fn test_store_grows_with_retargeted_input() {
        let small = input("tiny input");
        let large = input(&"word ".repeat(250_000));
        let dir = tempfile::tempdir().expect("temp dir");

        let mut config = config_for(small.path());
        config.pipeline.chunk_size = 4096;
        config.storage.db_path = Some(dir.path().join("db"));

        let mut stats = WordStats::new(config).expect("engine");
        stats.run().expect("small run");
        stats.set_input_path(large.path()).expect("retarget");
        stats.run().expect("large run");
        assert_eq!(stats.top_n(2).expect("top"), vec![("word".to_string(), 250_000)]);
        stats.close().expect("close");
    }
}
