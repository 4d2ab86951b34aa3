use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use chrono::Local;
use env_logger::{Builder, Target};
use log::LevelFilter;

use crate::error::{Error, Result};

/// Install the process logger: `"{time} [{level}] - {message}"` at `level`,
/// appended to `log_file` when given, otherwise written to stderr.
pub fn init_logger(level: LevelFilter, log_file: Option<&Path>) -> Result<()> {
    let mut builder = Builder::new();
    builder
        .format(|buf, record| {
            writeln!(buf,
                "{} [{}] - {}",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter(None, level);

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            builder.target(Target::Pipe(Box::new(file)));
        },
        None => {
            builder.target(Target::Stderr);
        },
    }

    builder
        .try_init()
        .map_err(|e| Error::config(format!("Logger already initialised: {}", e)))
}
