use std::fs::File;
use std::path::Path;

use memmap2::Mmap;

use super::HEADER_DELIMITER;
use crate::error::{ReadError, Result};
use crate::{Record, RecordCollection};

/// Accumulates the lines of the record currently being parsed
#[derive(Default)]
struct RecordBuilder {
    /// Header of the in-progress record, `None` until the first header line
    header: Option<String>,
    /// Concatenated sequence lines of the in-progress record
    sbuf: String,
}
impl RecordBuilder {
    /// Starts a new record, returning the previous one if a header had been seen
    fn start(&mut self, header: &str) -> Option<Record> {
        let finished = self.finish();
        self.header = Some(header.trim().to_string());
        finished
    }

    /// Appends a sequence line to the in-progress record
    ///
    /// Lines seen before any header are dropped.
    fn push_line(&mut self, line: &str) {
        if self.header.is_none() {
            return;
        }
        self.sbuf
            .extend(line.trim().chars().filter(|c| !matches!(c, ' ' | '\t')));
    }

    /// Takes the in-progress record, leaving the builder empty
    fn finish(&mut self) -> Option<Record> {
        let header = self.header.take()?;
        Some(Record {
            header,
            sequence: std::mem::take(&mut self.sbuf),
        })
    }
}

/// Parses FASTA text into an ordered record collection
///
/// This never fails: blank lines are skipped and sequence lines preceding the first
/// header are discarded.
#[must_use]
pub fn parse_str(text: &str) -> RecordCollection {
    let mut records = Vec::new();
    let mut builder = RecordBuilder::default();

    for line in text.split(['\n', '\r']) {
        if line.is_empty() {
            continue;
        }
        if let Some(header) = line.strip_prefix(HEADER_DELIMITER) {
            if let Some(record) = builder.start(header) {
                records.push(record);
            }
        } else {
            builder.push_line(line);
        }
    }
    if let Some(record) = builder.finish() {
        records.push(record);
    }

    records
}

/// Parses raw FASTA bytes into an ordered record collection
///
/// Invalid UTF-8 sequences are replaced with `U+FFFD` rather than raising an error.
#[must_use]
pub fn parse_bytes(bytes: &[u8]) -> RecordCollection {
    parse_str(&String::from_utf8_lossy(bytes))
}

/// Reads and parses a FASTA file
///
/// The file is memory-mapped and decoded with [`parse_bytes`], so only I/O failures
/// produce an error.
pub fn read_fasta_file<P: AsRef<Path>>(path: P) -> Result<RecordCollection> {
    let path = path.as_ref();

    // Verify input file is a file before attempting to map
    let file = File::open(path)?;
    let metadata = file.metadata()?;
    if !metadata.is_file() {
        return Err(ReadError::IncompatibleFile(path.display().to_string()).into());
    }
    if metadata.len() == 0 {
        return Ok(Vec::new());
    }

    // Safety: the file is open and won't be modified while mapped
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(parse_bytes(&mmap))
}
