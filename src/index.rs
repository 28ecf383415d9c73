//! In-memory digest index
//!
//! Loads a T3C table once and answers digest -> plaintext queries with a single
//! hash map lookup. Keys are stored in normalized form (see
//! [`DigestFunction::normalize`](crate::digest::DigestFunction::normalize)), so
//! `5E88...` and `5e88...` resolve to the same record.
//!
//! When a digest appears more than once the record loaded last wins.

use crate::codec::{
    parse_header, sniff_algorithm, ParsedLine, TableFormat, COMMENT_MARKER, SIMPLE_COMMENT_MARKER,
};
use crate::digest::HashAlgorithm;
use crate::encoding::TableLines;
use crate::error::{Result, T3cError};

use ahash::RandomState;
use hashbrown::HashMap;
use std::fs::File;
use std::io::BufRead;
use std::path::Path;

/// Rough size of one table line, used to pre-size the index from the file size
const ESTIMATED_LINE_BYTES: u64 = 32;

/// Upper bound on the pre-sized capacity
const MAX_PRESIZE: usize = 64 * 1024 * 1024;

/// Counters gathered while loading a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadStats {
    /// Well-formed record lines, duplicates included
    pub loaded: u64,
    /// Malformed lines
    pub skipped: u64,
    /// Header and comment lines
    pub comments: u64,
    /// Records whose digest replaced an earlier record
    pub duplicates: u64,
}

/// Incremental table construction
///
/// Leading blank and comment lines leave the flavor open. An `Algorithm:`
/// header decides it, otherwise the caller's hint, otherwise it is sniffed
/// from the first data line.
pub struct TableBuilder {
    hint: Option<HashAlgorithm>,
    format: Option<TableFormat>,
    entries: HashMap<String, String, RandomState>,
    stats: LoadStats,
}

impl TableBuilder {
    pub fn new(hint: Option<HashAlgorithm>) -> Self {
        Self::with_capacity(hint, 0)
    }

    pub fn with_capacity(hint: Option<HashAlgorithm>, capacity: usize) -> Self {
        Self {
            hint,
            format: None,
            entries: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
            stats: LoadStats::default(),
        }
    }

    /// Feed one line (terminator optional)
    pub fn push_line(&mut self, line: &str) {
        let format = match self.format {
            Some(format) => format,
            None => match self.resolve_format(line) {
                Some(format) => format,
                None => return,
            },
        };

        match format.parse_line(line) {
            ParsedLine::Record { digest, plaintext } => {
                let key = format.algorithm().normalize(digest).into_owned();
                if self.entries.insert(key, plaintext.to_string()).is_some() {
                    self.stats.duplicates += 1;
                }
                self.stats.loaded += 1;
            }
            ParsedLine::Comment => self.stats.comments += 1,
            ParsedLine::Malformed => {
                self.stats.skipped += 1;
                log::trace!("Skipping malformed table line: {:?}", line);
            }
        }
    }

    /// Decide the flavor from a line seen before any data record.
    ///
    /// Returns `None` when the line was consumed here: a header (which fixes
    /// the flavor), or a comment, blank or unrecognizable line (which leaves
    /// it open).
    fn resolve_format(&mut self, line: &str) -> Option<TableFormat> {
        if let Some(algorithm) = parse_header(line) {
            if let Some(hint) = self.hint.filter(|&h| h != algorithm) {
                log::warn!(
                    "Table header declares {}, ignoring requested {}",
                    algorithm,
                    hint
                );
            }
            self.format = Some(TableFormat::new(algorithm));
            self.stats.comments += 1;
            return None;
        }

        let trimmed = line.trim_end_matches(['\n', '\r']);
        if trimmed.is_empty() {
            self.stats.skipped += 1;
            return None;
        }
        if trimmed.starts_with(COMMENT_MARKER) || trimmed.starts_with(SIMPLE_COMMENT_MARKER) {
            self.stats.comments += 1;
            return None;
        }

        let algorithm = match self.hint.or_else(|| sniff_algorithm(trimmed)) {
            Some(algorithm) => algorithm,
            None => {
                self.stats.skipped += 1;
                log::trace!("Skipping unrecognized table line: {:?}", line);
                return None;
            }
        };
        log::debug!("No table header, assuming {}", algorithm);

        let format = TableFormat::new(algorithm);
        self.format = Some(format);
        Some(format)
    }

    /// Freeze the index. No further mutation is possible after this.
    pub fn finish(self) -> (LookupTable, LoadStats) {
        let algorithm = self
            .format
            .map(|f| f.algorithm())
            .or(self.hint)
            .unwrap_or_default();

        let table = LookupTable {
            algorithm,
            entries: self.entries,
        };
        (table, self.stats)
    }
}

/// Read-only digest index
#[derive(Debug)]
pub struct LookupTable {
    algorithm: HashAlgorithm,
    entries: HashMap<String, String, RandomState>,
}

impl LookupTable {
    /// Load a table file.
    ///
    /// Fails only when the file cannot be opened or mapped; malformed content
    /// is counted in [`LoadStats`].
    pub fn load(path: &Path, hint: Option<HashAlgorithm>) -> Result<(Self, LoadStats)> {
        let open_error = |source| T3cError::TableOpen {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(open_error)?;
        let lines = TableLines::new(&file).map_err(open_error)?;

        let capacity = ((lines.size() as u64 / ESTIMATED_LINE_BYTES) as usize).min(MAX_PRESIZE);
        log::debug!("Loading {:?} ({} bytes, capacity {})", path, lines.size(), capacity);

        let mut builder = TableBuilder::with_capacity(hint, capacity);
        for line in lines {
            builder.push_line(&line);
        }

        let (table, stats) = builder.finish();
        log::info!(
            "Loaded {} records ({} unique, {} skipped) from {:?}",
            stats.loaded,
            table.len(),
            stats.skipped,
            path
        );
        Ok((table, stats))
    }

    /// Load a table from any buffered reader
    ///
    /// Invalid UTF-8 is replaced rather than rejected, as in [`LookupTable::load`].
    pub fn from_reader<R: BufRead>(mut reader: R, hint: Option<HashAlgorithm>) -> Result<(Self, LoadStats)> {
        let mut builder = TableBuilder::new(hint);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            builder.push_line(&String::from_utf8_lossy(&buf));
        }
        Ok(builder.finish())
    }

    /// Resolve a digest. The query is normalized but not trimmed.
    #[inline]
    pub fn lookup(&self, digest: &str) -> Option<&str> {
        let key = self.algorithm.normalize(digest);
        self.entries.get(&*key).map(String::as_str)
    }

    /// Digest family of the loaded table
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Number of distinct digests
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Approximate heap usage in bytes
    pub fn memory_usage(&self) -> usize {
        let strings: usize = self
            .entries
            .iter()
            .map(|(k, v)| k.capacity() + v.capacity())
            .sum();
        strings + self.entries.capacity() * std::mem::size_of::<(String, String)>()
    }

    /// Tear down the index, freeing every entry. Returns the number freed.
    pub fn release(mut self) -> usize {
        let freed = self.entries.len();
        self.entries.clear();
        self.entries.shrink_to_fit();
        log::debug!("Released {} table entries", freed);
        freed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    const PASSWORD_SHA256: &str = "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8";

    fn table(content: &str) -> (LookupTable, LoadStats) {
        LookupTable::from_reader(Cursor::new(content), None).unwrap()
    }

    #[test]
    fn test_uppercase_query() {
        let (table, stats) = table(&format!("{}:password\n", PASSWORD_SHA256));

        assert_eq!(stats.loaded, 1);
        assert_eq!(table.algorithm(), HashAlgorithm::Sha256);
        assert_eq!(table.lookup(&PASSWORD_SHA256.to_uppercase()), Some("password"));
        assert_eq!(table.lookup(PASSWORD_SHA256), Some("password"));
    }

    #[test]
    fn test_uppercase_key_in_file() {
        let (table, _) = table(&format!(
            "# Algorithm: SHA256\n{}:password\n",
            PASSWORD_SHA256.to_uppercase()
        ));
        assert_eq!(table.lookup(PASSWORD_SHA256), Some("password"));
    }

    #[test]
    fn test_plaintext_case_preserved() {
        let (table, _) = table("ab12:PassWord\n");
        assert_eq!(table.lookup("AB12"), Some("PassWord"));
    }

    #[test]
    fn test_duplicate_last_wins() {
        let (table, stats) = table("abc;hello\nabc;world\n");

        assert_eq!(table.algorithm(), HashAlgorithm::Simple);
        assert_eq!(stats.loaded, 2);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(table.len(), 1);

        for _ in 0..10 {
            assert_eq!(table.lookup("abc"), Some("world"));
        }
    }

    #[test]
    fn test_line_without_separator() {
        let (table, stats) = table("no separator here\n");

        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.loaded, 0);
        assert!(table.is_empty());
    }

    #[test]
    fn test_empty_table() {
        let (table, stats) = table("");

        assert_eq!(stats, LoadStats::default());
        assert!(table.is_empty());
        assert_eq!(table.lookup(PASSWORD_SHA256), None);
        assert_eq!(table.lookup(""), None);
    }

    #[test]
    fn test_counts_independent_of_order() {
        let good = ["a1:one", "b2:two", "c3:three"];
        let bad = ["garbage", ":empty digest"];

        let interleaved = format!("{}\n{}\n{}\n{}\n{}\n", good[0], bad[0], good[1], bad[1], good[2]);
        let bad_last = format!("{}\n{}\n{}\n{}\n{}\n", good[0], good[1], good[2], bad[0], bad[1]);

        for content in [interleaved, bad_last] {
            let (table, stats) = table(&content);
            assert_eq!(stats.loaded, 3);
            assert_eq!(stats.skipped, 2);
            assert_eq!(table.lookup("B2"), Some("two"));
        }
    }

    #[test]
    fn test_header_not_a_record() {
        let (table, stats) = table("# Algorithm: SIMPLE\n294;abc\n; a comment\n");

        assert_eq!(table.algorithm(), HashAlgorithm::Simple);
        assert_eq!(stats.comments, 2);
        assert_eq!(stats.loaded, 1);
        assert_eq!(stats.skipped, 0);
        assert_eq!(table.lookup("294"), Some("abc"));
        assert_eq!(table.lookup("0294"), Some("abc"));
    }

    #[test]
    fn test_header_overrides_hint() {
        let (table, _) =
            LookupTable::from_reader(Cursor::new("# Algorithm: SIMPLE\n294;abc\n"), Some(HashAlgorithm::Sha256))
                .unwrap();
        assert_eq!(table.algorithm(), HashAlgorithm::Simple);
    }

    #[test]
    fn test_hint_used_without_header() {
        // Colon-separated lines are malformed for a SIMPLE table
        let (table, stats) =
            LookupTable::from_reader(Cursor::new("ab:x\n12;y\n"), Some(HashAlgorithm::Simple)).unwrap();

        assert_eq!(table.algorithm(), HashAlgorithm::Simple);
        assert_eq!(stats.skipped, 1);
        assert_eq!(table.lookup("12"), Some("y"));
    }

    #[test]
    fn test_independent_tables() {
        let (first, _) = table("aa:first\n");
        let (second, _) = table("bb:second\n");

        assert_eq!(first.lookup("aa"), Some("first"));
        assert_eq!(first.lookup("bb"), None);
        assert_eq!(second.lookup("aa"), None);
        assert_eq!(second.lookup("bb"), Some("second"));
    }

    #[test]
    fn test_query_not_trimmed() {
        let (table, _) = table("aa:first\n");
        assert_eq!(table.lookup(" aa"), None);
        assert_eq!(table.lookup("aa "), None);
    }

    #[test]
    fn test_load_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "# Algorithm: SHA256\r\n{}:password\r\nbroken\r\n", PASSWORD_SHA256).unwrap();

        let (table, stats) = LookupTable::load(file.path(), None).unwrap();
        assert_eq!(stats.loaded, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.comments, 1);
        assert_eq!(table.lookup(PASSWORD_SHA256), Some("password"));
    }

    #[test]
    fn test_load_empty_file() {
        let file = NamedTempFile::new().unwrap();

        let (table, stats) = LookupTable::load(file.path(), None).unwrap();
        assert_eq!(stats.loaded, 0);
        assert_eq!(stats.skipped, 0);
        assert!(table.lookup("anything").is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("missing.t3c");

        let err = LookupTable::load(&path, None).unwrap_err();
        assert!(matches!(err, T3cError::TableOpen { .. }));
    }

    #[test]
    fn test_release() {
        let (table, _) = table("aa:1\nbb:2\ncc:3\n");
        assert!(table.memory_usage() > 0);
        assert_eq!(table.release(), 3);
    }

    #[test]
    fn test_semicolon_header() {
        let (table, stats) = table("; Algorithm: SIMPLE\n294;abc\n98;b\n");

        assert_eq!(table.algorithm(), HashAlgorithm::Simple);
        assert_eq!(stats.comments, 1);
        assert_eq!(stats.loaded, 2);
        assert_eq!(stats.skipped, 0);
        assert_eq!(table.lookup("294"), Some("abc"));
        assert_eq!(table.lookup("98"), Some("b"));
    }

    #[test]
    fn test_leading_comment_before_data() {
        let (table, stats) = table("# generated by hand\n294;abc\n");

        assert_eq!(table.algorithm(), HashAlgorithm::Simple);
        assert_eq!(stats.comments, 1);
        assert_eq!(stats.loaded, 1);
        assert_eq!(table.lookup("294"), Some("abc"));
    }

    #[test]
    fn test_leading_blank_line() {
        let (table, stats) = table("\n294;abc\n");

        assert_eq!(table.algorithm(), HashAlgorithm::Simple);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.loaded, 1);
        assert_eq!(table.lookup("294"), Some("abc"));
    }

    #[test]
    fn test_header_after_comments() {
        let (table, stats) = table("; made by hand\n\n# Algorithm: SIMPLE\n12;x\n");

        assert_eq!(table.algorithm(), HashAlgorithm::Simple);
        assert_eq!(stats.comments, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(table.lookup("012"), Some("x"));
    }

    #[test]
    fn test_invalid_utf8_is_not_fatal() {
        let content: &[u8] = b"aa:first\nbb:caf\xE9\ncc:third\n";
        let (table, stats) = LookupTable::from_reader(Cursor::new(content), None).unwrap();

        assert_eq!(stats.loaded, 3);
        assert_eq!(table.lookup("aa"), Some("first"));
        assert_eq!(table.lookup("bb"), Some("caf\u{FFFD}"));
        assert_eq!(table.lookup("cc"), Some("third"));
    }

    #[test]
    fn test_builder_incremental() {
        let mut builder = TableBuilder::new(None);
        builder.push_line("# Algorithm: SHA256\n");
        builder.push_line("AA:x\n");
        builder.push_line("aa:y\n");

        let (table, stats) = builder.finish();
        assert_eq!(stats.duplicates, 1);
        assert_eq!(table.lookup("Aa"), Some("y"));
    }
}
