//! Digest functions
//!
//! Two interchangeable digest families are supported:
//! - `SIMPLE`: sum of the input bytes modulo 10000, written as a decimal numeral
//! - `SHA256`: SHA-256 of the input, written as 64 lowercase hex characters
//!
//! Both the generator and the lookup index go through [`DigestFunction`], so
//! adding a family only means adding an implementation and a [`HashAlgorithm`]
//! variant.

use crate::error::T3cError;
use clap::ValueEnum;
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Modulus applied by the simple digest (4-digit condensat)
pub const SIMPLE_MODULUS: u32 = 10_000;

/// Length of a hex-encoded SHA-256 digest
pub const SHA256_HEX_LEN: usize = 64;

/// Trait for digest implementations
pub trait DigestFunction: Send + Sync {
    /// Algorithm name as written in the table header
    fn name(&self) -> &'static str;

    /// Compute the textual digest of `input`
    fn digest(&self, input: &str) -> String;

    /// Bring a digest into its canonical comparison form.
    ///
    /// Table keys and queries both pass through this, so two spellings of the
    /// same digest always compare equal.
    fn normalize<'a>(&self, digest: &'a str) -> Cow<'a, str>;
}

/// Non-cryptographic byte-sum digest
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleDigest;

impl SimpleDigest {
    #[inline]
    pub fn value(input: &str) -> u32 {
        input
            .bytes()
            .fold(0u32, |acc, b| acc.wrapping_add(u32::from(b)))
            % SIMPLE_MODULUS
    }
}

impl DigestFunction for SimpleDigest {
    fn name(&self) -> &'static str {
        "SIMPLE"
    }

    fn digest(&self, input: &str) -> String {
        Self::value(input).to_string()
    }

    fn normalize<'a>(&self, digest: &'a str) -> Cow<'a, str> {
        // Numerals compare by value: "0042" and "42" are the same condensat
        match digest.parse::<u32>() {
            Ok(n) => {
                let canonical = n.to_string();
                if canonical == digest {
                    Cow::Borrowed(digest)
                } else {
                    Cow::Owned(canonical)
                }
            }
            Err(_) => Cow::Borrowed(digest),
        }
    }
}

/// SHA-256 digest, lowercase hex
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Digest;

impl DigestFunction for Sha256Digest {
    fn name(&self) -> &'static str {
        "SHA256"
    }

    fn digest(&self, input: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(input.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn normalize<'a>(&self, digest: &'a str) -> Cow<'a, str> {
        if digest.bytes().any(|b| b.is_ascii_uppercase()) {
            Cow::Owned(digest.to_ascii_lowercase())
        } else {
            Cow::Borrowed(digest)
        }
    }
}

static SIMPLE: SimpleDigest = SimpleDigest;
static SHA256: Sha256Digest = Sha256Digest;

/// Digest family selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum HashAlgorithm {
    /// Byte sum modulo 10000 (fast, not cryptographic)
    Simple,
    /// SHA-256 (64 hex characters)
    #[value(alias = "sha-256")]
    Sha256,
}

impl HashAlgorithm {
    /// Name written in the `# Algorithm:` header
    pub fn name(self) -> &'static str {
        self.function().name()
    }

    /// Field separator used by tables of this family
    pub fn separator(self) -> char {
        match self {
            Self::Simple => ';',
            Self::Sha256 => ':',
        }
    }

    /// The digest implementation for this family
    pub fn function(self) -> &'static dyn DigestFunction {
        match self {
            Self::Simple => &SIMPLE,
            Self::Sha256 => &SHA256,
        }
    }

    #[inline]
    pub fn digest(self, input: &str) -> String {
        self.function().digest(input)
    }

    #[inline]
    pub fn normalize(self, digest: &str) -> Cow<'_, str> {
        self.function().normalize(digest)
    }

    /// Whether digests of this family are hexadecimal (case-insensitive)
    pub fn is_hex(self) -> bool {
        matches!(self, Self::Sha256)
    }
}

impl Default for HashAlgorithm {
    fn default() -> Self {
        Self::Sha256
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = T3cError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SIMPLE" => Ok(Self::Simple),
            "SHA256" | "SHA-256" => Ok(Self::Sha256),
            _ => Err(T3cError::UnknownAlgorithm(s.trim().to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            HashAlgorithm::Sha256.digest("password"),
            "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8"
        );
        assert_eq!(HashAlgorithm::Sha256.digest("").len(), SHA256_HEX_LEN);
    }

    #[test]
    fn test_simple_digest() {
        // 'a' + 'b' + 'c' = 97 + 98 + 99
        assert_eq!(HashAlgorithm::Simple.digest("abc"), "294");
        assert_eq!(HashAlgorithm::Simple.digest(""), "0");

        let long = "z".repeat(200); // 122 * 200 = 24400
        assert_eq!(SimpleDigest::value(&long), 4400);
    }

    #[test]
    fn test_sha256_normalize() {
        let upper = "5E884898DA28047151D0E56F8DC6292773603D0D6AABBDD62A11EF721D1542D8";
        let lower = "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8";

        assert_eq!(HashAlgorithm::Sha256.normalize(upper), lower);
        assert!(matches!(HashAlgorithm::Sha256.normalize(lower), Cow::Borrowed(_)));
    }

    #[test]
    fn test_simple_normalize() {
        assert_eq!(HashAlgorithm::Simple.normalize("0042"), "42");
        assert_eq!(HashAlgorithm::Simple.normalize("42"), "42");
        assert_eq!(HashAlgorithm::Simple.normalize("abc"), "abc");
    }

    #[test]
    fn test_from_str() {
        assert_eq!("sha256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!("SHA-256".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Sha256);
        assert_eq!(" Simple ".parse::<HashAlgorithm>().unwrap(), HashAlgorithm::Simple);
        assert!(matches!(
            "md5".parse::<HashAlgorithm>(),
            Err(T3cError::UnknownAlgorithm(name)) if name == "md5"
        ));
    }

    #[test]
    fn test_separators_differ() {
        assert_eq!(HashAlgorithm::Sha256.separator(), ':');
        assert_eq!(HashAlgorithm::Simple.separator(), ';');
        assert!(HashAlgorithm::Sha256.is_hex());
        assert!(!HashAlgorithm::Simple.is_hex());
    }
}
