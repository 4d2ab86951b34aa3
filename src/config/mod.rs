pub mod file;
pub mod subsystems;

use serde::{Serialize, Deserialize};
use std::path::Path;
use std::fs;
use crate::error::Result;
use log::{warn, trace};

pub trait FromIni {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WordstatConfig {
    // File paths
    pub files: file::FileConfig,

    // Subsystem configs
    pub pipeline: subsystems::PipelineConfig,
    pub storage: subsystems::StorageConfig,
    pub report: subsystems::ReportConfig,
}

impl WordstatConfig {
    pub fn validate(&self) -> Result<()> {
        self.files.validate()?;
        self.pipeline.validate()?;
        self.storage.validate()?;
        self.report.validate()?;
        Ok(())
    }

    pub fn from_ini<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        trace!("Loading configuration from: {:?}", path.as_ref());
        Self::from_ini_str(&content)
    }

    pub fn from_ini_str(content: &str) -> Result<Self> {
        let mut config = Self::default();
        let mut current_section = String::new();

        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                current_section = line[1..line.len()-1].trim().to_string();
                trace!("  Line {}: Found section: [{}]", line_num + 1, current_section);
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                let key = key.trim();
                let value = value.trim();

                // Delegate to appropriate subsystem config
                let handled = match current_section.as_str() {
                    "file" => config.files.from_ini_section(&current_section, key, value),
                    "pipeline" => config.pipeline.from_ini_section(&current_section, key, value),
                    "storage" => config.storage.from_ini_section(&current_section, key, value),
                    "report" => config.report.from_ini_section(&current_section, key, value),
                    _ => None,
                };

                match handled {
                    Some(Err(e)) => return Err(e),
                    Some(Ok(())) => {},
                    None => warn!("Unrecognized config key: {}={} in section [{}]", key, value, current_section),
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// JSON rendering of the effective configuration, for debug logs.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
