// src/config/subsystems/report.rs

use serde::{Serialize, Deserialize};
use crate::error::{Error, Result};
use crate::config::FromIni;

/// Output flavour of the final report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportFormat {
    /// Plain text written to the output file.
    PlainText,
    /// XML document written to the output file.
    Xml,
    /// Plain text echoed to stdout.
    Console,
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::PlainText => "file",
            ReportFormat::Xml => "xml",
            ReportFormat::Console => "console",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "file" | "text" | "txt" => Some(Self::PlainText),
            "xml" => Some(Self::Xml),
            "console" => Some(Self::Console),
            _ => None,
        }
    }

    /// Whether the format writes to a file and therefore needs an output path.
    pub fn needs_output_path(&self) -> bool {
        !matches!(self, ReportFormat::Console)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    pub top_n: Option<usize>,
    pub format: Option<ReportFormat>,
}

impl FromIni for ReportConfig {
    fn from_ini_section(&mut self, section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        if section_name != "report" {
            return None;
        }

        match key {
            "top_n" | "top" => {
                match value.parse() {
                    Ok(n) => {
                        self.top_n = Some(n);
                        Some(Ok(()))
                    },
                    Err(_) => Some(Err(Error::Config(
                        format!("Invalid top_n: {}", value)
                    ))),
                }
            },
            "format" | "output_format" => {
                match ReportFormat::from_str(value) {
                    Some(format) => {
                        self.format = Some(format);
                        Some(Ok(()))
                    },
                    None => Some(Err(Error::Config(
                        format!("Invalid output format (must be xml, file or console): {}", value)
                    ))),
                }
            },
            _ => None,
        }
    }
}

impl ReportConfig {
    pub fn validate(&self) -> Result<()> {
        Ok(())
    }
}
