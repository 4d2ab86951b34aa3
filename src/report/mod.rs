//! Rendering of query results as a plain-text, XML or console report.

pub mod xml;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use log::info;

use crate::config::subsystems::ReportFormat;
use crate::error::{Error, Result};
use crate::types::ResultPair;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Entry {
    pub key: String,
    pub value: String,
}

/// Ranked words and emoticon positions, ready to render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub(crate) words: Vec<Entry>,
    pub(crate) smileys: Vec<Entry>,
}

fn pair_up(pairs: &[ResultPair], what: &str) -> Result<Vec<Entry>> {
    if pairs.len() % 2 != 0 {
        return Err(Error::report(format!(
            "{} result pairs must come in couples, got {} pairs",
            what,
            pairs.len()
        )));
    }
    Ok(pairs
        .chunks_exact(2)
        .map(|couple| Entry {
            key: couple[0].value.clone(),
            value: couple[1].value.clone(),
        })
        .collect())
}

impl Report {
    /// Build from `("Word", w), ("Id", f)` and `("Code", c), ("Id", p)` couples.
    pub fn from_pairs(word_pairs: &[ResultPair], smiley_pairs: &[ResultPair]) -> Result<Self> {
        Ok(Self {
            words: pair_up(word_pairs, "Word")?,
            smileys: pair_up(smiley_pairs, "Emoticon")?,
        })
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    pub fn smiley_count(&self) -> usize {
        self.smileys.len()
    }

    pub fn write_text<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "Words and their frequencies")?;
        for entry in &self.words {
            write!(out, "Word: {},\nFrequency: {};\n", entry.key, entry.value)?;
        }
        writeln!(out, "\nSmileys and their positions")?;
        for entry in &self.smileys {
            write!(out, "Smiley: {},\nPosition: {};\n", entry.key, entry.value)?;
        }
        Ok(())
    }

    /// Render in `format` to `out`. Console and plain text share a layout.
    pub fn render<W: Write>(&self, format: ReportFormat, out: &mut W) -> Result<()> {
        match format {
            ReportFormat::PlainText | ReportFormat::Console => self.write_text(out)?,
            ReportFormat::Xml => xml::write_xml(self, out)?,
        }
        out.flush()?;
        Ok(())
    }

    /// Render to the output file for `xml`/`file`, or to stdout for `console`.
    pub fn publish(&self, format: ReportFormat, output: Option<&Path>) -> Result<()> {
        match (format, output) {
            (ReportFormat::Console, _) => {
                let stdout = io::stdout();
                let mut lock = stdout.lock();
                self.render(format, &mut lock)
            },
            (_, Some(path)) => {
                let mut writer = BufWriter::new(File::create(path)?);
                self.render(format, &mut writer)?;
                info!("Wrote {} report to {:?}", format.as_str(), path);
                Ok(())
            },
            (_, None) => Err(Error::report(format!(
                "The {} format needs an output file path",
                format.as_str()
            ))),
        }
    }
}
