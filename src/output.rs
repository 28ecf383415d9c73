//! Table output
//!
//! Buffered writer producing T3C table files.

use crate::codec::{Record, TableFormat};
use crate::digest::HashAlgorithm;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Default buffer size for table writing (8MB)
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024 * 1024;

/// Buffered T3C table writer
pub struct TableWriter<W: Write = File> {
    writer: BufWriter<W>,
    format: TableFormat,
    path: Option<PathBuf>,
    records_written: u64,
    bytes_written: u64,
}

impl TableWriter<File> {
    /// Create (or truncate) a table file and write its header
    pub fn create(path: PathBuf, algorithm: HashAlgorithm, buffer_size: usize) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        let mut writer = Self::from_writer(file, algorithm, buffer_size)?;
        writer.path = Some(path);
        Ok(writer)
    }
}

impl<W: Write> TableWriter<W> {
    /// Wrap any writer and write the header line
    pub fn from_writer(inner: W, algorithm: HashAlgorithm, buffer_size: usize) -> std::io::Result<Self> {
        let format = TableFormat::new(algorithm);
        let mut writer = BufWriter::with_capacity(buffer_size, inner);

        let header = format.header();
        writer.write_all(header.as_bytes())?;

        Ok(Self {
            writer,
            format,
            path: None,
            records_written: 0,
            bytes_written: header.len() as u64,
        })
    }

    /// Write one digest/plaintext pair
    pub fn write_fields(&mut self, digest: &str, plaintext: &str) -> std::io::Result<()> {
        let line = self.format.format_fields(digest, plaintext);
        self.writer.write_all(line.as_bytes())?;
        self.records_written += 1;
        self.bytes_written += line.len() as u64;
        Ok(())
    }

    pub fn write_record(&mut self, record: &Record) -> std::io::Result<()> {
        self.write_fields(&record.digest, &record.plaintext)
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }

    /// Flush and return the inner writer
    pub fn into_inner(self) -> std::io::Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }

    pub fn format(&self) -> TableFormat {
        self.format
    }

    /// Output path, when writing to a file
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Bytes written, header included
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

/// Ensure the parent directory of an output file exists
pub fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            std::fs::create_dir_all(parent)
        }
        _ => Ok(()),
    }
}
