//! FASTA writer module
//!
//! This module provides functionality for writing record collections as wrapped FASTA text.
//! It includes support for:
//! - Streaming writes to any `Write` implementation
//! - Configurable line width with validation at build time
//! - Whole-collection serialization to a `String` or a file

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::{HEADER_DELIMITER, WRAP_DEFAULT};
use crate::error::{FormatError, Result};
use crate::Record;

/// Validates a wrap width, rejecting zero
fn validate_width(width: usize) -> Result<usize> {
    if width == 0 {
        return Err(FormatError::InvalidWidth(width).into());
    }
    Ok(width)
}

/// Splits a sequence into consecutive slices of at most `width` characters
///
/// Slices are cut on character boundaries so replacement characters from lossy
/// decoding are never split.
fn wrap(sequence: &str, width: usize) -> impl Iterator<Item = &str> {
    let mut starts = sequence
        .char_indices()
        .map(|(idx, _)| idx)
        .step_by(width)
        .peekable();
    std::iter::from_fn(move || {
        let start = starts.next()?;
        let end = starts.peek().copied().unwrap_or(sequence.len());
        Some(&sequence[start..end])
    })
}

/// Builder for creating configured `FastaWriter` instances
///
/// # Examples
///
/// ```
/// # use seqprep::{Record, Result};
/// # use seqprep::fasta::FastaWriterBuilder;
/// # fn main() -> Result<()> {
/// let mut writer = FastaWriterBuilder::default().width(60).build(Vec::new())?;
/// writer.write_record(&Record::new("s1", "ACGT"))?;
/// assert_eq!(writer.into_inner(), b">s1\nACGT\n");
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct FastaWriterBuilder {
    /// Optional line width, defaults to [`WRAP_DEFAULT`]
    width: Option<usize>,
}
impl FastaWriterBuilder {
    #[must_use]
    pub fn width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    pub fn build<W: Write>(self, inner: W) -> Result<FastaWriter<W>> {
        FastaWriter::new(inner, self.width.unwrap_or(WRAP_DEFAULT))
    }
}

/// Streaming writer for FASTA records
///
/// # Type Parameters
///
/// * `W` - The underlying writer type that implements `Write`
pub struct FastaWriter<W: Write> {
    /// The underlying writer for output
    inner: W,

    /// Maximum number of sequence characters per line
    width: usize,

    /// Number of records written
    records_written: usize,
}
impl<W: Write> FastaWriter<W> {
    /// Creates a new `FastaWriter`
    ///
    /// Returns [`FormatError::InvalidWidth`] if `width` is zero.
    pub fn new(inner: W, width: usize) -> Result<Self> {
        Ok(Self {
            inner,
            width: validate_width(width)?,
            records_written: 0,
        })
    }

    /// Writes a single record as a header line followed by its wrapped sequence
    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        writeln!(self.inner, "{HEADER_DELIMITER}{}", record.header)?;
        for line in wrap(&record.sequence, self.width) {
            self.inner.write_all(line.as_bytes())?;
            self.inner.write_all(b"\n")?;
        }
        self.records_written += 1;
        Ok(())
    }

    /// Writes every record of a collection in order
    pub fn write_all_records(&mut self, records: &[Record]) -> Result<()> {
        records
            .iter()
            .try_for_each(|record| self.write_record(record))
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }

    /// Consumes the writer and returns the underlying writer
    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Serializes a record collection into FASTA text wrapped at `width` characters
///
/// Returns [`FormatError::InvalidWidth`] if `width` is zero.
pub fn serialize(records: &[Record], width: usize) -> Result<String> {
    let mut writer = FastaWriter::new(Vec::new(), width)?;
    writer.write_all_records(records)?;
    // Headers and sequences are `String`s, so the output is valid UTF-8
    Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
}

/// Writes a record collection to a FASTA file, replacing any existing content
pub fn write_fasta_file<P: AsRef<Path>>(path: P, records: &[Record], width: usize) -> Result<()> {
    let handle = File::create(path).map(BufWriter::new)?;
    let mut writer = FastaWriter::new(handle, width)?;
    writer.write_all_records(records)?;
    writer.flush()
}
