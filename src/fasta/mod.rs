//! # FASTA codec
//!
//! Parsing and serialization of FASTA text into ordered [`Record`](crate::Record) collections.
//!
//! ## Reading
//!
//! Parsing is permissive:
//!
//! - `\n`, `\r\n` and lone `\r` all end a line
//! - a line starting with `>` starts a new record; the rest of the line, trimmed, is the header
//! - sequence lines are trimmed, stripped of spaces and tabs, and concatenated
//! - blank lines are skipped and never end a record
//! - sequence lines before the first header are dropped
//! - invalid UTF-8 is replaced with `U+FFFD` instead of failing
//!
//! ```
//! use seqprep::fasta::parse_str;
//!
//! let records = parse_str(">s1 first\nACGT\nAC\n\n>s2\nRYSW\n");
//! assert_eq!(records.len(), 2);
//! assert_eq!(records[0].header, "s1 first");
//! assert_eq!(records[0].sequence, "ACGTAC");
//! ```
//!
//! ## Writing
//!
//! Each record is written as a `>` header line followed by its sequence wrapped to at most
//! `width` characters per line ([`WRAP_DEFAULT`] by default).
//!
//! ```
//! use seqprep::{fasta::serialize, Record, Result};
//!
//! fn main() -> Result<()> {
//!     let records = vec![Record::new("s1", "ACGTACGTAC")];
//!     assert_eq!(serialize(&records, 4)?, ">s1\nACGT\nACGT\nAC\n");
//!     Ok(())
//! }
//! ```

mod reader;
mod writer;

pub use reader::{parse_bytes, parse_str, read_fasta_file};
pub use writer::{serialize, write_fasta_file, FastaWriter, FastaWriterBuilder};

/// Default line width for FASTA output
pub const WRAP_DEFAULT: usize = 80;

/// Record delimiter at the start of every header line
pub const HEADER_DELIMITER: char = '>';
