use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Column separator of the output file. The file carries a `.csv` extension
/// for the analysis tooling, but rows are tab-separated.
pub const SEPARATOR: &str = "\t";

/// Append-mode tabular output sink. Every row is flushed immediately so a
/// crash never loses more than the current line.
#[derive(Debug)]
pub struct RowWriter {
    out: BufWriter<File>,
    path: PathBuf,
}

impl RowWriter {
    /// Opens the output file for one session. The name embeds the participant
    /// number and the start timestamp.
    pub fn create(dir: &Path, participant: u32, stamp: &str) -> std::io::Result<Self> {
        let path = dir.join(format!("participant_{:02}_{}.csv", participant, stamp));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            out: BufWriter::new(file),
            path,
        })
    }

    pub fn write_row(&mut self, columns: &[String]) -> std::io::Result<()> {
        writeln!(self.out, "{}", columns.join(SEPARATOR))?;
        self.out.flush()
    }

    /// Writes a raw line, used for the abort sentinel.
    pub fn write_line(&mut self, line: &str) -> std::io::Result<()> {
        writeln!(self.out, "{}", line)?;
        self.out.flush()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
