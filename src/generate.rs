//! Table generation
//!
//! Streams one or more wordlists, digests every non-empty line and writes the
//! resulting records to a T3C table. Lines are hashed in parallel chunks; each
//! chunk is fully digested before any of it is written, so the table keeps the
//! wordlist order.

use crate::cli::GenerateArgs;
use crate::digest::HashAlgorithm;
use crate::encoding::WordlistLines;
use crate::error::{Result, T3cError};
use crate::output::{ensure_parent_dir, TableWriter};
use crate::progress::{create_bytes_progress_bar, print_header, print_info, print_success, print_warning};

use bytesize::ByteSize;
use colored::*;
use rayon::prelude::*;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use walkdir::WalkDir;

/// Lines hashed per parallel batch
pub const CHUNK_LINES: usize = 64 * 1024;

/// Generator configuration
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    pub algorithm: HashAlgorithm,
    pub output: PathBuf,
    pub recursive: bool,
    pub extensions: Vec<String>,
    pub buffer_size: usize,
    pub quiet: bool,
    pub verbose: bool,
}

impl GenerateConfig {
    pub fn from_args(args: &GenerateArgs) -> Result<Self> {
        Ok(Self {
            algorithm: args.algorithm,
            output: args.output_path()?,
            recursive: args.recursive,
            extensions: args.get_extensions(),
            buffer_size: args.parse_buffer_size()?,
            quiet: args.quiet,
            verbose: args.verbose,
        })
    }
}

/// Counters for one generation run
#[derive(Debug, Clone, Default)]
pub struct GenerateStats {
    pub files: u64,
    pub input_bytes: u64,
    pub lines_read: u64,
    pub empty_skipped: u64,
    pub records_written: u64,
    pub bytes_written: u64,
    pub elapsed: Duration,
}

impl GenerateStats {
    pub fn lines_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.lines_read as f64 / secs
        } else {
            0.0
        }
    }

    /// Print final statistics
    pub fn print_summary(&self, algorithm: HashAlgorithm, output: &Path) {
        eprintln!();
        eprintln!("{}", "═".repeat(60).green());
        eprintln!("{}", "                    TABLE GENERATED".green().bold());
        eprintln!("{}", "═".repeat(60).green());
        eprintln!();

        eprintln!("  {} {:?}", "Table:          ".green(), output);
        eprintln!("  {} {}", "Algorithm:      ".green(), algorithm);
        eprintln!("  {} {} ({})", "Wordlists:      ".green(), self.files, ByteSize(self.input_bytes));
        eprintln!();

        eprintln!("  {} {}", "Lines read:     ".green(), crate::progress::format_number(self.lines_read));
        eprintln!("  {} {}", "Empty skipped:  ".yellow(), crate::progress::format_number(self.empty_skipped));
        eprintln!(
            "  {} {}",
            "Entries:        ".green().bold(),
            crate::progress::format_number(self.records_written).green().bold()
        );
        eprintln!("  {} {}", "Table size:     ".green(), ByteSize(self.bytes_written));

        eprintln!();
        eprintln!("  {} {}", "Duration:       ".green(), crate::progress::format_duration(self.elapsed));
        eprintln!("  {} {:.2} lines/sec", "Throughput:     ".green(), self.lines_per_second());
        eprintln!();
        eprintln!("{}", "═".repeat(60).green());
    }
}

/// Wordlist-to-table generator
pub struct Generator {
    config: GenerateConfig,
}

impl Generator {
    pub fn new(config: GenerateConfig) -> Self {
        Self { config }
    }

    /// Generate the table from a wordlist file or directory
    pub fn generate(&self, input: &Path) -> Result<GenerateStats> {
        let start = Instant::now();

        if !self.config.quiet {
            print_header("Scanning input...");
        }

        let files = self.collect_files(input)?;
        if files.is_empty() {
            print_warning("No wordlists found to process!");
        }

        let total_bytes: u64 = files.iter().map(|(_, size)| *size).sum();
        if !self.config.quiet {
            print_info(&format!("Found {} wordlists ({} total)", files.len(), ByteSize(total_bytes)));
            print_header(&format!("Generating {} table...", self.config.algorithm));
        }

        ensure_parent_dir(&self.config.output)?;
        let mut writer = TableWriter::create(
            self.config.output.clone(),
            self.config.algorithm,
            self.config.buffer_size,
        )?;

        let pb = if self.config.quiet {
            indicatif::ProgressBar::hidden()
        } else {
            create_bytes_progress_bar(total_bytes, "Hashing...")
        };

        let mut stats = GenerateStats {
            files: files.len() as u64,
            input_bytes: total_bytes,
            ..GenerateStats::default()
        };

        for (path, size) in &files {
            if self.config.verbose {
                pb.set_message(format!("Hashing {:?}...", path.file_name().unwrap_or_default()));
            }

            let lines = WordlistLines::open(path, self.config.buffer_size).map_err(|source| {
                T3cError::WordlistOpen {
                    path: path.clone(),
                    source,
                }
            })?;
            self.hash_lines(lines, &mut writer, &mut stats)?;

            pb.inc(*size);
        }

        writer.flush()?;
        pb.finish_with_message("Complete".green().to_string());

        stats.records_written = writer.records_written();
        stats.bytes_written = writer.bytes_written();
        stats.elapsed = start.elapsed();

        log::info!(
            "Wrote {} {} entries to {:?}",
            stats.records_written,
            self.config.algorithm,
            self.config.output
        );

        if !self.config.quiet {
            print_success(&format!("Table written to: {:?}", self.config.output));
        }

        Ok(stats)
    }

    /// Collect wordlists to process, with their sizes
    fn collect_files(&self, input: &Path) -> Result<Vec<(PathBuf, u64)>> {
        let mut files = Vec::new();

        if input.is_file() {
            files.push((input.to_path_buf(), fs::metadata(input)?.len()));
        } else if input.is_dir() {
            let walker = if self.config.recursive {
                WalkDir::new(input)
            } else {
                WalkDir::new(input).max_depth(1)
            };

            for entry in walker.sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }

                let matches = path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|ext| self.config.extensions.contains(&ext.to_lowercase()))
                    .unwrap_or(false);

                if matches {
                    files.push((path.to_path_buf(), fs::metadata(path)?.len()));
                }
            }
        } else {
            return Err(T3cError::WordlistOpen {
                path: input.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory"),
            });
        }

        Ok(files)
    }

    /// Digest every line of one wordlist into the table
    fn hash_lines<I, W>(&self, lines: I, writer: &mut TableWriter<W>, stats: &mut GenerateStats) -> Result<()>
    where
        I: Iterator<Item = std::io::Result<String>>,
        W: Write,
    {
        let algorithm = self.config.algorithm;
        let mut chunk: Vec<String> = Vec::with_capacity(CHUNK_LINES);

        for line in lines {
            let line = line?;
            stats.lines_read += 1;

            if line.is_empty() {
                stats.empty_skipped += 1;
                continue;
            }

            chunk.push(line);
            if chunk.len() >= CHUNK_LINES {
                write_chunk(algorithm, &chunk, writer)?;
                chunk.clear();
            }
        }

        write_chunk(algorithm, &chunk, writer)
    }
}

/// Hash a batch in parallel, then write it in input order
fn write_chunk<W: Write>(algorithm: HashAlgorithm, chunk: &[String], writer: &mut TableWriter<W>) -> Result<()> {
    let digests: Vec<String> = chunk.par_iter().map(|word| algorithm.digest(word)).collect();

    for (digest, word) in digests.iter().zip(chunk) {
        writer.write_fields(digest, word)?;
    }

    Ok(())
}

/// Generate a table in memory from an iterator of words, without any terminal output
pub fn generate_to_writer<I, S, W>(words: I, algorithm: HashAlgorithm, out: W) -> Result<W>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
    W: Write,
{
    let config = GenerateConfig {
        algorithm,
        output: PathBuf::new(),
        recursive: false,
        extensions: Vec::new(),
        buffer_size: crate::output::DEFAULT_BUFFER_SIZE,
        quiet: true,
        verbose: false,
    };

    let mut writer = TableWriter::from_writer(out, algorithm, 64 * 1024)?;
    let mut stats = GenerateStats::default();
    let lines = words.into_iter().map(|w| Ok(w.into()));

    Generator::new(config).hash_lines(lines, &mut writer, &mut stats)?;
    Ok(writer.into_inner()?)
}
