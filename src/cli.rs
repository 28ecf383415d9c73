//! Command-line interface definition for condensat
//!
//! Two modes, mirroring the classic `G` / `L` switches: `generate` builds a
//! table from wordlists, `lookup` resolves digests read from stdin.

use crate::digest::HashAlgorithm;
use crate::error::{Result, T3cError};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

/// Digest-to-plaintext lookup tables
#[derive(Parser, Debug, Clone)]
#[command(
    name = "condensat",
    author = "m0h1nd4",
    version,
    about = "Generate digest lookup tables (T3C) from wordlists and resolve digests back to plaintext",
    long_about = r#"
Build a "condensat-chaine" table (T3C) mapping each wordlist entry's digest to
the entry itself, then load it in memory and resolve digests in constant time.

EXAMPLES:
    # Build a SHA-256 table from a wordlist
    condensat generate -i rockyou.txt -o rockyou.t3c

    # Build a table with the fast 4-digit digest
    condensat generate -i words.txt -o words.t3c -a simple

    # Resolve digests from a file (results on stdout, misses on stderr)
    condensat lookup -t rockyou.t3c < hashes.txt

    # Classic short form
    condensat G words.txt words.t3c
    echo 5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8 | condensat L words.t3c

TABLE FORMAT:
    # Algorithm: SHA256
    <digest>:<plaintext>        (SHA256 tables)
    <digest>;<plaintext>        (SIMPLE tables)
"#
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Digest every line of a wordlist into a table
    #[command(alias = "G")]
    Generate(GenerateArgs),

    /// Load a table and resolve digests read from stdin
    #[command(alias = "L")]
    Lookup(LookupArgs),
}

impl Command {
    pub fn quiet(&self) -> bool {
        match self {
            Self::Generate(args) => args.quiet,
            Self::Lookup(args) => args.quiet,
        }
    }

    pub fn verbose(&self) -> bool {
        match self {
            Self::Generate(args) => args.verbose,
            Self::Lookup(args) => args.verbose,
        }
    }
}

#[derive(ClapArgs, Debug, Clone)]
pub struct GenerateArgs {
    /// Wordlist file or directory of wordlists
    #[arg(short, long, value_name = "PATH", required_unless_present = "input_pos")]
    pub input: Option<PathBuf>,

    /// Output table file
    #[arg(short, long, value_name = "TABLE", required_unless_present = "output_pos")]
    pub output: Option<PathBuf>,

    #[arg(value_name = "WORDLIST", conflicts_with = "input", hide = true)]
    pub input_pos: Option<PathBuf>,

    #[arg(value_name = "TABLE", conflicts_with = "output", hide = true)]
    pub output_pos: Option<PathBuf>,

    /// Digest algorithm
    #[arg(short, long, value_enum, default_value_t = HashAlgorithm::Sha256)]
    pub algorithm: HashAlgorithm,

    /// Process directories recursively
    #[arg(short, long, default_value_t = false)]
    pub recursive: bool,

    /// File extensions to process in directories (default: txt)
    #[arg(long, value_name = "EXT", default_value = "txt")]
    pub extensions: String,

    /// Buffer size for file operations
    #[arg(long, value_name = "SIZE", default_value = "8MB")]
    pub buffer_size: String,

    /// Number of hashing threads (default: auto-detect)
    #[arg(short = 't', long, value_name = "NUM")]
    pub threads: Option<usize>,

    /// Quiet mode - minimal output
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,

    /// Verbose mode - detailed logging
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct LookupArgs {
    /// Table file to load
    #[arg(short, long, value_name = "TABLE", required_unless_present = "table_pos")]
    pub table: Option<PathBuf>,

    #[arg(value_name = "TABLE", conflicts_with = "table", hide = true)]
    pub table_pos: Option<PathBuf>,

    /// Digest algorithm, for tables without an `# Algorithm:` header
    #[arg(short, long, value_enum)]
    pub algorithm: Option<HashAlgorithm>,

    /// Quiet mode - results and misses only
    #[arg(short, long, default_value_t = false)]
    pub quiet: bool,

    /// Verbose mode - detailed logging
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl GenerateArgs {
    /// Wordlist path, from the flag or the positional form
    pub fn input_path(&self) -> Result<PathBuf> {
        self.input
            .clone()
            .or_else(|| self.input_pos.clone())
            .ok_or_else(|| missing("wordlist"))
    }

    /// Table path, from the flag or the positional form
    pub fn output_path(&self) -> Result<PathBuf> {
        self.output
            .clone()
            .or_else(|| self.output_pos.clone())
            .ok_or_else(|| missing("output table"))
    }

    /// Parse buffer size string to bytes
    pub fn parse_buffer_size(&self) -> Result<usize> {
        parse_size(&self.buffer_size)
    }

    /// Parse file extensions to process
    pub fn get_extensions(&self) -> Vec<String> {
        self.extensions
            .split(',')
            .map(|s| s.trim().trim_start_matches('.').to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl LookupArgs {
    pub fn table_path(&self) -> Result<PathBuf> {
        self.table
            .clone()
            .or_else(|| self.table_pos.clone())
            .ok_or_else(|| missing("table"))
    }
}

fn missing(what: &str) -> T3cError {
    T3cError::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        format!("missing {} path", what),
    ))
}

/// Parse human-readable size string to bytes
pub fn parse_size(size_str: &str) -> Result<usize> {
    let upper = size_str.trim().to_uppercase();

    let (num_str, multiplier) = if let Some(n) = upper.strip_suffix("GB") {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = upper.strip_suffix("MB") {
        (n, 1024 * 1024)
    } else if let Some(n) = upper.strip_suffix("KB") {
        (n, 1024)
    } else if let Some(n) = upper.strip_suffix('B') {
        (n, 1)
    } else {
        (upper.as_str(), 1)
    };

    let num: usize = num_str
        .trim()
        .parse()
        .map_err(|_| T3cError::InvalidSize(size_str.to_string()))?;

    num.checked_mul(multiplier)
        .ok_or_else(|| T3cError::InvalidSize(size_str.to_string()))
}
