//! # condensat
//!
//! Digest-to-plaintext lookup tables ("condensat-chaîne" tables, T3C).
//!
//! ## Features
//!
//! - **Generation**: digest every line of a wordlist (or a directory of
//!   wordlists) into a table, hashing in parallel
//! - **Constant-time lookup**: the table is loaded once into a hash index and
//!   each digest is resolved with a single hash lookup
//! - **Tolerant loading**: malformed lines are counted and skipped, headers and
//!   comments are recognized, hex digests compare case-insensitively
//! - **Pluggable digests**: a fast 4-digit byte-sum digest and SHA-256
//!
//! ## Usage
//!
//! ```bash
//! # Build a table
//! condensat generate -i rockyou.txt -o rockyou.t3c
//!
//! # Resolve digests from stdin
//! condensat lookup -t rockyou.t3c < hashes.txt
//! ```
//!
//! ## Example
//!
//! ```rust
//! use condensat::index::LookupTable;
//! use std::io::Cursor;
//!
//! let table = "# Algorithm: SHA256\n\
//!     5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8:password\n";
//! let (table, stats) = LookupTable::from_reader(Cursor::new(table), None).unwrap();
//!
//! assert_eq!(stats.loaded, 1);
//! assert_eq!(
//!     table.lookup("5E884898DA28047151D0E56F8DC6292773603D0D6AABBDD62A11EF721D1542D8"),
//!     Some("password")
//! );
//! ```

pub mod cli;
pub mod codec;
pub mod digest;
pub mod encoding;
pub mod error;
pub mod generate;
pub mod index;
pub mod output;
pub mod progress;
pub mod session;

pub use cli::Args;
pub use codec::{Record, TableFormat};
pub use digest::{DigestFunction, HashAlgorithm};
pub use error::{Result, T3cError};
pub use generate::{GenerateConfig, Generator};
pub use index::{LoadStats, LookupTable};
pub use session::{SessionDriver, SessionStats};
