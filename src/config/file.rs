// src/config/file.rs

use serde::{Serialize, Deserialize};
use std::path::PathBuf;
use crate::error::Result;
use super::FromIni;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    pub input_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
}

impl FromIni for FileConfig {
    fn from_ini_section(&mut self, _section_name: &str, key: &str, value: &str) -> Option<Result<()>> {
        match key {
            "input_path" | "input_file_path" => {
                self.input_path = Some(PathBuf::from(value.trim_matches('"')));
                Some(Ok(()))
            },
            "output_path" | "output_file_path" => {
                self.output_path = Some(PathBuf::from(value.trim_matches('"')));
                Some(Ok(()))
            },
            _ => None,
        }
    }
}

impl FileConfig {
    pub fn validate(&self) -> Result<()> {
        // Existence of the input is checked when the engine opens it, so a missing
        // file surfaces as InputNotFound rather than a config error.
        if let Some(output) = &self.output_path {
            if output.as_os_str().is_empty() {
                return Err(crate::error::Error::config("output_path must not be empty"));
            }
        }
        Ok(())
    }
}
