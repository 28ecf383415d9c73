//! T3C table line codec
//!
//! A table is a text file with one record per line:
//!
//! ```text
//! # Algorithm: SHA256
//! 5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8:password
//! ```
//!
//! The separator depends on the digest family (`:` for SHA256, `;` for SIMPLE).
//! The line is split at the first separator, so plaintexts may contain the
//! separator as long as the digest field does not.

use crate::digest::HashAlgorithm;

/// Marker starting a comment line in every table flavor
pub const COMMENT_MARKER: char = '#';

/// Alternative comment marker accepted by SIMPLE (`;`-separated) tables
pub const SIMPLE_COMMENT_MARKER: char = ';';

/// Prefix of the header line recording the digest family
pub const HEADER_PREFIX: &str = "# Algorithm:";

/// One digest/plaintext pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub digest: String,
    pub plaintext: String,
}

impl Record {
    pub fn new(digest: impl Into<String>, plaintext: impl Into<String>) -> Self {
        Self {
            digest: digest.into(),
            plaintext: plaintext.into(),
        }
    }
}

/// Result of parsing one table line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine<'a> {
    /// A data record, borrowing from the line
    Record { digest: &'a str, plaintext: &'a str },
    /// Header or comment, ignored without counting as an error
    Comment,
    /// No separator, or an empty digest field
    Malformed,
}

/// Framing rules for one table flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableFormat {
    algorithm: HashAlgorithm,
    separator: char,
}

impl TableFormat {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            separator: algorithm.separator(),
        }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    /// Whether a line is a comment in this flavor
    #[inline]
    pub fn is_comment(&self, line: &str) -> bool {
        line.starts_with(COMMENT_MARKER)
            || (self.algorithm == HashAlgorithm::Simple && line.starts_with(SIMPLE_COMMENT_MARKER))
    }

    /// Parse a line with its terminator already removed.
    ///
    /// A trailing `\r` or `\n` is stripped anyway so CRLF tables load cleanly.
    pub fn parse_line<'a>(&self, line: &'a str) -> ParsedLine<'a> {
        let line = strip_terminator(line);

        if self.is_comment(line) {
            return ParsedLine::Comment;
        }

        match line.split_once(self.separator) {
            Some((digest, plaintext)) if !digest.is_empty() => {
                ParsedLine::Record { digest, plaintext }
            }
            _ => ParsedLine::Malformed,
        }
    }

    /// Parse a line into an owned record, `None` for comments and malformed lines
    pub fn parse_record(&self, line: &str) -> Option<Record> {
        match self.parse_line(line) {
            ParsedLine::Record { digest, plaintext } => Some(Record::new(digest, plaintext)),
            _ => None,
        }
    }

    /// Format a record as one terminated table line
    pub fn format_record(&self, record: &Record) -> String {
        self.format_fields(&record.digest, &record.plaintext)
    }

    /// Format digest and plaintext without building a [`Record`]
    pub fn format_fields(&self, digest: &str, plaintext: &str) -> String {
        let mut line = String::with_capacity(digest.len() + plaintext.len() + 2);
        line.push_str(digest);
        line.push(self.separator);
        line.push_str(plaintext);
        line.push('\n');
        line
    }

    /// Header line naming this flavor's algorithm
    pub fn header(&self) -> String {
        format_header(self.algorithm)
    }
}

/// Header line for a table produced with `algorithm`
pub fn format_header(algorithm: HashAlgorithm) -> String {
    format!("{} {}\n", HEADER_PREFIX, algorithm.name())
}

/// Recognize a `# Algorithm: <NAME>` header, or its `; Algorithm: <NAME>`
/// form from SIMPLE tables.
///
/// Returns `None` for any other line, including headers naming an unknown
/// algorithm.
pub fn parse_header(line: &str) -> Option<HashAlgorithm> {
    let line = strip_terminator(line).trim();
    let body = line
        .strip_prefix(COMMENT_MARKER)
        .or_else(|| line.strip_prefix(SIMPLE_COMMENT_MARKER))?;
    let (key, name) = body.split_once(':')?;

    if !key.trim().eq_ignore_ascii_case("algorithm") {
        return None;
    }

    name.trim().parse().ok()
}

/// Guess the flavor of a header-less table from its first data line.
///
/// Digests never contain either separator, so whichever occurs first ends the
/// digest field.
pub fn sniff_algorithm(line: &str) -> Option<HashAlgorithm> {
    let line = strip_terminator(line);
    if line.is_empty() || line.starts_with(COMMENT_MARKER) {
        return None;
    }

    let colon = line.find(HashAlgorithm::Sha256.separator());
    let semicolon = line.find(HashAlgorithm::Simple.separator());

    match (colon, semicolon) {
        (Some(0), _) | (_, Some(0)) => None,
        (Some(c), Some(s)) if s < c => Some(HashAlgorithm::Simple),
        (Some(_), _) => Some(HashAlgorithm::Sha256),
        (None, Some(_)) => Some(HashAlgorithm::Simple),
        (None, None) => None,
    }
}

#[inline]
fn strip_terminator(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}
