use std::fmt;

/// An ordered collection of records, in file encounter order
pub type RecordCollection = Vec<Record>;

/// A single FASTA record
///
/// The header is stored without the leading `>` and is trimmed of surrounding
/// whitespace. The sequence never contains whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Record {
    /// Header text without the `>` delimiter
    pub header: String,
    /// Sequence text over the extended nucleotide alphabet
    pub sequence: String,
}
impl Record {
    pub fn new(header: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            sequence: sequence.into(),
        }
    }

    /// Returns the header of this record
    #[must_use]
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Returns the sequence of this record
    #[must_use]
    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    /// Returns the number of characters in the sequence
    #[must_use]
    pub fn len(&self) -> usize {
        self.sequence.chars().count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Returns a copy of this record with a different sequence
    #[must_use]
    pub fn with_sequence(&self, sequence: String) -> Self {
        Self {
            header: self.header.clone(),
            sequence,
        }
    }
}
impl<H: Into<String>, S: Into<String>> From<(H, S)> for Record {
    fn from((header, sequence): (H, S)) -> Self {
        Self::new(header, sequence)
    }
}
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ">{}\n{}", self.header, self.sequence)
    }
}

/// Collects the sequences of a record collection as string slices
#[must_use]
pub fn sequences(records: &[Record]) -> Vec<&str> {
    records.iter().map(Record::sequence).collect()
}
