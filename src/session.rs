//! Lookup session driver
//!
//! Reads digests one per line, resolves them against a [`LookupTable`] and
//! writes each plaintext to the result stream as soon as it is found. Misses
//! and the closing summary go to a separate diagnostic stream so that the
//! result stream only ever carries resolved plaintexts.

use crate::error::Result;
use crate::index::LookupTable;
use std::io::{BufRead, Write};

/// Counters for one lookup session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    pub total_searches: u64,
    pub found_count: u64,
    pub not_found_count: u64,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_found(&mut self) {
        self.total_searches += 1;
        self.found_count += 1;
    }

    pub fn record_not_found(&mut self) {
        self.total_searches += 1;
        self.not_found_count += 1;
    }

    pub fn percent_found(&self) -> f64 {
        percent(self.found_count, self.total_searches)
    }

    pub fn percent_not_found(&self) -> f64 {
        percent(self.not_found_count, self.total_searches)
    }

    /// Write the end-of-session summary
    pub fn write_summary<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out)?;
        writeln!(out, "=== Search statistics ===")?;
        writeln!(out, "Total searches: {}", self.total_searches)?;
        writeln!(
            out,
            "Found:          {} ({:.2}%)",
            self.found_count,
            self.percent_found()
        )?;
        writeln!(
            out,
            "Not found:      {} ({:.2}%)",
            self.not_found_count,
            self.percent_not_found()
        )?;
        out.flush()
    }
}

fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

/// Runs the query loop over a loaded table
pub struct SessionDriver {
    table: LookupTable,
    stats: SessionStats,
}

impl SessionDriver {
    pub fn new(table: LookupTable) -> Self {
        Self {
            table,
            stats: SessionStats::new(),
        }
    }

    pub fn table(&self) -> &LookupTable {
        &self.table
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Resolve one query line, writing the outcome.
    ///
    /// Only the line terminator is stripped; lines empty after that are ignored.
    ///
    /// Returns `Some(found)` for a counted search, `None` for a skipped line.
    pub fn query<W: Write, D: Write>(&mut self, line: &str, out: &mut W, diag: &mut D) -> Result<Option<bool>> {
        let digest = line.trim_end_matches(['\n', '\r']);
        if digest.is_empty() {
            return Ok(None);
        }

        match self.table.lookup(digest) {
            Some(plaintext) => {
                writeln!(out, "{}", plaintext)?;
                out.flush()?;
                self.stats.record_found();
                Ok(Some(true))
            }
            None => {
                writeln!(diag, "No plaintext found for digest: {}", digest)?;
                self.stats.record_not_found();
                Ok(Some(false))
            }
        }
    }

    /// Drive the session to end of input, print the summary and release the table
    ///
    /// Query lines that are not valid UTF-8 are decoded lossily and resolve
    /// like any other digest.
    pub fn run<R: BufRead, W: Write, D: Write>(mut self, mut input: R, mut out: W, mut diag: D) -> Result<SessionStats> {
        let mut buf = Vec::new();

        loop {
            buf.clear();
            if input.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            self.query(&String::from_utf8_lossy(&buf), &mut out, &mut diag)?;
        }

        self.stats.write_summary(&mut diag)?;

        let freed = self.table.release();
        log::debug!(
            "Session finished: {} searches, {} entries released",
            self.stats.total_searches,
            freed
        );

        Ok(self.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const PASSWORD_SHA256: &str = "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8";

    fn driver(content: &str) -> SessionDriver {
        let (table, _) = LookupTable::from_reader(Cursor::new(content), None).unwrap();
        SessionDriver::new(table)
    }

    fn run(content: &str, queries: &str) -> (SessionStats, String, String) {
        let mut out = Vec::new();
        let mut diag = Vec::new();
        let stats = driver(content)
            .run(Cursor::new(queries), &mut out, &mut diag)
            .unwrap();
        (
            stats,
            String::from_utf8(out).unwrap(),
            String::from_utf8(diag).unwrap(),
        )
    }

    #[test]
    fn test_found_and_not_found() {
        let table = format!("# Algorithm: SHA256\n{}:password\n", PASSWORD_SHA256);
        let queries = format!("{}\nffff\n", PASSWORD_SHA256.to_uppercase());

        let (stats, out, diag) = run(&table, &queries);

        assert_eq!(out, "password\n");
        assert!(diag.contains("No plaintext found for digest: ffff"));
        assert!(!out.contains("ffff"));
        assert_eq!(stats.total_searches, 2);
        assert_eq!(stats.found_count, 1);
        assert_eq!(stats.not_found_count, 1);
    }

    #[test]
    fn test_empty_lines_not_counted() {
        let (stats, out, _) = run("aa:x\nbb:y\n", "\naa\n\r\n\nbb\r\n");

        assert_eq!(out, "x\ny\n");
        assert_eq!(stats.total_searches, 2);
        assert_eq!(stats.found_count + stats.not_found_count, stats.total_searches);
    }

    #[test]
    fn test_whitespace_query_is_counted() {
        let (stats, out, diag) = run("aa:x\n", "   \n aa\naa\n");

        assert_eq!(out, "x\n");
        assert_eq!(stats.total_searches, 3);
        assert_eq!(stats.not_found_count, 2);
        assert!(diag.contains("No plaintext found for digest:    \n"));
    }

    #[test]
    fn test_invalid_utf8_query() {
        let mut out = Vec::new();
        let mut diag = Vec::new();
        let queries: &[u8] = b"aa\n\xFF\naa\n";

        let stats = driver("aa:x\n")
            .run(Cursor::new(queries), &mut out, &mut diag)
            .unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "x\nx\n");
        assert_eq!(stats.total_searches, 3);
        assert_eq!(stats.not_found_count, 1);

        let diag = String::from_utf8(diag).unwrap();
        assert!(diag.contains("No plaintext found for digest: \u{FFFD}"));
        assert!(diag.contains("Total searches: 3"));
    }

    #[test]
    fn test_results_in_query_order() {
        let (_, out, _) = run("aa:1\nbb:2\ncc:3\n", "cc\naa\nzz\nbb\naa\n");
        assert_eq!(out, "3\n1\n2\n1\n");
    }

    #[test]
    fn test_summary() {
        let (_, _, diag) = run("aa:1\n", "aa\nbb\ncc\naa\n");

        assert!(diag.contains("Total searches: 4"));
        assert!(diag.contains("Found:          2 (50.00%)"));
        assert!(diag.contains("Not found:      2 (50.00%)"));
    }

    #[test]
    fn test_empty_session() {
        let (stats, out, diag) = run("aa:1\n", "");

        assert_eq!(stats, SessionStats::default());
        assert!(out.is_empty());
        assert!(diag.contains("Total searches: 0"));
        assert!(diag.contains("(0.00%)"));
    }

    #[test]
    fn test_empty_table_session() {
        let (stats, out, _) = run("", "aa\nbb\n");

        assert!(out.is_empty());
        assert_eq!(stats.not_found_count, 2);
    }

    #[test]
    fn test_query_single() {
        let mut driver = driver("aa:1\n");
        let mut out = Vec::new();
        let mut diag = Vec::new();

        assert_eq!(driver.query("AA\n", &mut out, &mut diag).unwrap(), Some(true));
        assert_eq!(driver.query("\n", &mut out, &mut diag).unwrap(), None);
        assert_eq!(driver.query("bb", &mut out, &mut diag).unwrap(), Some(false));
        assert_eq!(driver.stats().total_searches, 2);
        assert_eq!(driver.table().len(), 1);
    }

    #[test]
    fn test_percentages() {
        let stats = SessionStats {
            total_searches: 3,
            found_count: 1,
            not_found_count: 2,
        };
        assert!((stats.percent_found() - 33.333).abs() < 0.01);
        assert!((stats.percent_not_found() - 66.666).abs() < 0.01);
        assert_eq!(SessionStats::new().percent_found(), 0.0);
    }
}
