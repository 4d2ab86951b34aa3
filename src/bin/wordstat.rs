use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use chrono::Local;
use clap::Parser;
use clap::error::ErrorKind;
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, error};
use wordstat::{
    ExecutionMode,
    ReportFormat,
    Result,
    WordStats,
    WordstatConfig,
    utils::init_logger,
};

const DEFAULT_CONFIG: &str = "default.ini";

#[derive(Parser, Debug)]
#[command(version, about = "Word frequencies and emoticon positions for large text files", long_about = None)]
struct Args {
    /// Portion of the input, in bytes, handed to a worker at a time
    #[arg(short = 'c', long = "chunk-size", alias = "chunk_size")]
    chunk_size: Option<usize>,

    /// The input file path
    #[arg(short = 'i', long = "input-file-path", alias = "input_file_path")]
    input_file_path: Option<PathBuf>,

    /// Directory of the LMDB store; results are kept in memory when omitted
    #[arg(short = 'd', long = "db-path", alias = "db_path")]
    db_path: Option<PathBuf>,

    /// Number of most frequent words to report
    #[arg(short = 'n', long = "top")]
    top: Option<usize>,

    /// Output format: xml, file or console
    #[arg(short = 'f', long = "output-format", alias = "output_format")]
    output_format: Option<String>,

    /// The output file path, required for xml and file output
    #[arg(short = 'o', long = "output-file-path", alias = "output_file_path")]
    output_file_path: Option<PathBuf>,

    /// Configuration file (INI); defaults to default.ini when present
    #[arg(long)]
    config: Option<PathBuf>,

    /// Worker threads, 0 for one per core
    #[arg(long)]
    workers: Option<usize>,

    /// Execution mode: batch or streaming
    #[arg(long)]
    mode: Option<String>,

    /// Log level: off, error, warn, info, debug, trace
    #[arg(long = "log-level")]
    log_level: Option<String>,
}

enum Failure {
    Usage(String),
    Fatal(wordstat::Error),
}

impl From<wordstat::Error> for Failure {
    fn from(e: wordstat::Error) -> Self {
        Failure::Fatal(e)
    }
}

fn load_config(path: Option<&Path>) -> Result<WordstatConfig> {
    match path {
        Some(path) => WordstatConfig::from_ini(path),
        None if Path::new(DEFAULT_CONFIG).is_file() => WordstatConfig::from_ini(DEFAULT_CONFIG),
        None => Ok(WordstatConfig::default()),
    }
}

/// Command-line values win over the configuration file.
fn apply_overrides(config: &mut WordstatConfig, args: &Args) -> std::result::Result<(), Failure> {
    if let Some(size) = args.chunk_size {
        if size == 0 {
            return Err(Failure::Usage("Usage error: chunk size must be greater than 0".to_string()));
        }
        config.pipeline.chunk_size = size;
    }
    if let Some(path) = &args.input_file_path {
        config.files.input_path = Some(path.clone());
    }
    if let Some(path) = &args.db_path {
        config.storage.db_path = Some(path.clone());
    }
    if let Some(top) = args.top {
        config.report.top_n = Some(top);
    }
    if let Some(format) = &args.output_format {
        let parsed = ReportFormat::from_str(format)
            .ok_or_else(|| Failure::Usage(format!("Usage error: Invalid output format: {}", format)))?;
        config.report.format = Some(parsed);
    }
    if let Some(path) = &args.output_file_path {
        config.files.output_path = Some(path.clone());
    }
    if let Some(workers) = args.workers {
        config.pipeline.worker_count = workers;
    }
    if let Some(mode) = &args.mode {
        config.pipeline.mode = ExecutionMode::from_str(mode)
            .ok_or_else(|| Failure::Usage(format!("Usage error: Invalid mode: {}", mode)))?;
    }
    if let Some(level) = &args.log_level {
        config.pipeline.set_log_level(level)
            .map_err(|e| Failure::Usage(format!("Usage error: {}", e)))?;
    }
    Ok(())
}

fn check_usage(config: &WordstatConfig) -> std::result::Result<(usize, ReportFormat), Failure> {
    if config.files.input_path.is_none() {
        return Err(Failure::Usage("Usage error: Input file path not specified".to_string()));
    }
    let top = config.report.top_n
        .ok_or_else(|| Failure::Usage("Usage error: Number of top words not specified".to_string()))?;
    let format = config.report.format.unwrap_or(ReportFormat::Console);
    if format.needs_output_path() && config.files.output_path.is_none() {
        return Err(Failure::Usage("Usage error: Missing output file path".to_string()));
    }
    Ok((top, format))
}

fn setup_logging(config: &WordstatConfig) -> Result<()> {
    let log_file = match &config.pipeline.log_file {
        Some(path) => path.clone(),
        None => {
            fs::create_dir_all("logs")?;
            let timestamp = Local::now().format("%Y%m%d_%H%M%S");
            PathBuf::from(format!("logs/wordstat_{}.log", timestamp))
        }
    };
    init_logger(config.pipeline.get_log_level(), Some(&log_file))
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{wide_bar:.cyan/blue}] {bytes}/{total_bytes} ({eta})")
    {
        bar.set_style(style.progress_chars("#>-"));
    }
    bar
}

fn run(args: Args) -> std::result::Result<(), Failure> {
    let mut config = load_config(args.config.as_deref())?;
    apply_overrides(&mut config, &args)?;
    let (top, format) = check_usage(&config)?;
    config.validate()?;

    setup_logging(&config)?;
    info!("Starting wordstat with log level: {:?}", config.pipeline.get_log_level());
    debug!("Effective configuration: {}", config.to_json()?);

    let mut stats = WordStats::new(config)?;

    let bar = progress_bar();
    let summary = stats.run_with_progress(Some(bar.clone()));
    bar.finish_and_clear();
    let summary = summary?;
    info!(
        "Run complete: {} chunks, {} words, {} emoticons",
        summary.chunks, summary.words, summary.emoticons
    );

    let report = stats.report(top)?;
    let output = stats.config().files.output_path.clone();
    report.publish(format, output.as_deref())?;

    stats.close()?;
    Ok(())
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(1),
            };
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Failure::Usage(message)) => {
            println!("{}", message);
            println!("Run with --help to see the usage.");
            ExitCode::from(1)
        },
        Err(Failure::Fatal(e)) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::from(1)
        },
    }
}
