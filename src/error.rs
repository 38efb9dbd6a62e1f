/// Custom Result type for seqprep operations, wrapping the custom [`Error`] type
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the seqprep library, encompassing all possible error cases
/// that can occur while reading, transforming, and writing sequence collections.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Errors that occur while opening FASTA files
    #[error(transparent)]
    ReadError(#[from] ReadError),
    /// Errors related to FASTA serialization settings
    #[error(transparent)]
    FormatError(#[from] FormatError),
    /// Errors raised when building a base distribution from raw weights
    #[error(transparent)]
    DistributionError(#[from] DistributionError),
    /// Errors that occur while indexing or accessing a dataset directory
    #[error(transparent)]
    DatasetError(#[from] DatasetError),
    /// Standard I/O errors from the Rust standard library
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    /// Errors compiling the dataset file-name pattern
    #[error(transparent)]
    RegexError(#[from] regex::Error),
    /// A worker thread panicked during parallel processing
    #[error("A worker thread panicked during parallel processing")]
    WorkerPanic,
    /// Generic errors that can occur in any part of the system
    #[error(transparent)]
    AnyhowError(#[from] anyhow::Error),
}

/// Errors that can occur while opening FASTA files
#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    /// The path being read is not a regular file (e.g., it might be a directory)
    ///
    /// # Arguments
    /// * `String` - The offending path
    #[error("File is not regular: {0}")]
    IncompatibleFile(String),
}

/// Errors raised by FASTA serialization
#[derive(thiserror::Error, Debug)]
pub enum FormatError {
    /// The requested line width for sequence wrapping is not positive
    ///
    /// # Arguments
    /// * `usize` - The invalid width that was provided
    #[error("Invalid wrap width: {0}. Width must be at least 1")]
    InvalidWidth(usize),
}

/// Errors raised when validating base weights
#[derive(thiserror::Error, Debug)]
pub enum DistributionError {
    /// At least one weight is negative, NaN, or infinite, or all weights are zero
    ///
    /// # Arguments
    /// * `[f64; 4]` - The rejected weights in A, C, G, T order
    #[error("Invalid base weights {0:?}: weights must be finite, non-negative, and sum to a positive value")]
    InvalidWeights([f64; 4]),

    /// The candidate weights of an ambiguity symbol cannot be sampled from
    #[error("Invalid candidate weights: {0}")]
    SamplingWeights(#[from] rand::distr::weighted::Error),
}

/// Errors that can occur while accessing a dataset directory
#[derive(thiserror::Error, Debug)]
pub enum DatasetError {
    /// Attempted to access a file index that is beyond the available range
    ///
    /// # Arguments
    /// * First `isize` - The requested file index
    /// * Second `usize` - The number of files in the dataset
    #[error("Requested file index ({0}) is out of range ({1} files)")]
    OutOfRange(isize, usize),

    /// The dataset path is not a directory
    ///
    /// # Arguments
    /// * `String` - The offending path
    #[error("Dataset path is not a directory: {0}")]
    NotADirectory(String),
}
