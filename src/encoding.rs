//! Line readers for wordlists and tables
//!
//! Wordlists come from anywhere and are sniffed for their encoding, then
//! transcoded to UTF-8 so the digest is always computed over UTF-8 bytes.
//! Tables are written by this tool as UTF-8 and are read through a memory map.

use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// Bytes sampled from the start of a file for encoding detection
const SAMPLE_SIZE: usize = 64 * 1024;

/// Result of encoding detection
#[derive(Debug, Clone)]
pub struct EncodingInfo {
    /// Detected encoding name
    pub name: &'static str,
    /// Confidence level (0.0 - 1.0)
    pub confidence: f32,
    pub encoding: &'static Encoding,
}

impl Default for EncodingInfo {
    fn default() -> Self {
        Self {
            name: "UTF-8",
            confidence: 1.0,
            encoding: encoding_rs::UTF_8,
        }
    }
}

/// Detect the encoding of a file by sampling its first bytes
pub fn detect_encoding(path: &Path) -> std::io::Result<EncodingInfo> {
    let mut file = File::open(path)?;

    let mut sample = Vec::with_capacity(SAMPLE_SIZE);
    file.by_ref().take(SAMPLE_SIZE as u64).read_to_end(&mut sample)?;

    Ok(detect_sample(&sample))
}

/// Detect the encoding of an in-memory sample
pub fn detect_sample(sample: &[u8]) -> EncodingInfo {
    if sample.is_empty() {
        return EncodingInfo::default();
    }

    if let Some((encoding, _)) = Encoding::for_bom(sample) {
        return EncodingInfo {
            name: encoding.name(),
            confidence: 1.0,
            encoding,
        };
    }

    let mut detector = EncodingDetector::new();
    detector.feed(sample, true);
    let encoding = detector.guess(None, true);

    let confidence = if encoding == encoding_rs::UTF_8 {
        if std::str::from_utf8(sample).is_ok() {
            1.0
        } else {
            0.5
        }
    } else {
        0.8
    };

    EncodingInfo {
        name: encoding.name(),
        confidence,
        encoding,
    }
}

/// Strip a trailing `\n` and `\r`
#[inline]
fn strip_line_end(mut bytes: &[u8]) -> &[u8] {
    if let Some(rest) = bytes.strip_suffix(b"\n") {
        bytes = rest;
    }
    if let Some(rest) = bytes.strip_suffix(b"\r") {
        bytes = rest;
    }
    bytes
}

/// Wordlist line iterator with transcoding to UTF-8
pub struct WordlistLines {
    reader: BufReader<File>,
    encoding: &'static Encoding,
    line_buffer: Vec<u8>,
    first_line: bool,
}

impl WordlistLines {
    /// Open a wordlist, detecting its encoding
    pub fn open(path: &Path, buffer_size: usize) -> std::io::Result<Self> {
        let info = detect_encoding(path)?;
        log::debug!(
            "{:?}: detected {} (confidence {:.1})",
            path,
            info.name,
            info.confidence
        );
        Self::with_encoding(path, info.encoding, buffer_size)
    }

    /// Open a wordlist with a known encoding
    pub fn with_encoding(
        path: &Path,
        encoding: &'static Encoding,
        buffer_size: usize,
    ) -> std::io::Result<Self> {
        let file = File::open(path)?;

        Ok(Self {
            reader: BufReader::with_capacity(buffer_size.max(4096), file),
            encoding,
            line_buffer: Vec::with_capacity(4096),
            first_line: true,
        })
    }
}

impl Iterator for WordlistLines {
    type Item = std::io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.line_buffer.clear();

        match self.reader.read_until(b'\n', &mut self.line_buffer) {
            Ok(0) => None,
            Ok(_) => {
                let mut bytes = strip_line_end(&self.line_buffer);

                if std::mem::take(&mut self.first_line) {
                    if let Some((_, bom_len)) = Encoding::for_bom(bytes) {
                        bytes = &bytes[bom_len..];
                    }
                }

                if self.encoding == encoding_rs::UTF_8 {
                    Some(Ok(String::from_utf8_lossy(bytes).into_owned()))
                } else {
                    let (decoded, had_errors) = self.encoding.decode_without_bom_handling(bytes);
                    if had_errors {
                        log::warn!("Encoding errors in wordlist line, using lossy conversion");
                    }
                    Some(Ok(decoded.into_owned()))
                }
            }
            Err(e) => Some(Err(e)),
        }
    }
}

/// Memory-mapped table reader yielding UTF-8 lines
pub struct TableLines {
    mmap: Option<memmap2::Mmap>,
    position: usize,
}

impl TableLines {
    /// Map an opened table file
    pub fn new(file: &File) -> std::io::Result<Self> {
        // Zero-length files cannot be mapped on every platform
        if file.metadata()?.len() == 0 {
            return Ok(Self {
                mmap: None,
                position: 0,
            });
        }

        let mmap = unsafe { memmap2::Mmap::map(file)? };
        let position = if mmap.starts_with(b"\xEF\xBB\xBF") { 3 } else { 0 };

        Ok(Self {
            mmap: Some(mmap),
            position,
        })
    }

    /// Total size of the mapped file
    pub fn size(&self) -> usize {
        self.mmap.as_ref().map_or(0, |m| m.len())
    }
}

impl Iterator for TableLines {
    type Item = String;

    fn next(&mut self) -> Option<Self::Item> {
        let mmap = self.mmap.as_ref()?;
        if self.position >= mmap.len() {
            return None;
        }

        let remaining = &mmap[self.position..];
        let line_end = memchr::memchr(b'\n', remaining)
            .map(|i| i + 1)
            .unwrap_or(remaining.len());

        let line_bytes = strip_line_end(&remaining[..line_end]);
        self.position += line_end;

        Some(String::from_utf8_lossy(line_bytes).into_owned())
    }
}
