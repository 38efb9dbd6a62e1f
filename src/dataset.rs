//! Indexed access to directories of numbered FASTA files
//!
//! A dataset is a flat directory holding files such as `test1.fasta`, `test2.fasta`, ...
//! Files are ordered by the number following the prefix, not lexicographically, so
//! `test10.fasta` comes after `test9.fasta`.

use std::ffi::OsStr;
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

use log::debug;
use regex::Regex;

use crate::error::{DatasetError, Result};
use crate::fasta::read_fasta_file;
use crate::{Record, RecordCollection};

/// Default file-name prefix of dataset files
pub const DEFAULT_PREFIX: &str = "test";

/// Extension of dataset files
pub const DATASET_EXTENSION: &str = ".fasta";

/// File-name suffixes recognized by [`list_fasta_files`]
pub const FASTA_SUFFIXES: [&str; 5] = [".fasta", ".fa", ".faa", ".fna", ".cds.fasta"];

/// The parsed content of a single FASTA file
#[derive(Debug, Clone)]
pub struct FastaContent {
    path: PathBuf,
    records: RecordCollection,
}
impl FastaContent {
    /// Reads and parses the file at `path`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let records = read_fasta_file(&path)?;
        Ok(Self { path, records })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name without its directory
    #[must_use]
    pub fn name(&self) -> String {
        file_name(&self.path)
    }

    #[must_use]
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    #[must_use]
    pub fn into_records(self) -> RecordCollection {
        self.records
    }

    #[must_use]
    pub fn sequences(&self) -> Vec<&str> {
        crate::record::sequences(&self.records)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(OsStr::to_string_lossy)
        .unwrap_or_default()
        .into_owned()
}

/// A directory of `<prefix><N>.fasta` files ordered by `N`
///
/// Only paths are kept in memory; files are parsed on access.
#[derive(Debug, Clone)]
pub struct FastaDataset {
    path: PathBuf,
    prefix: String,
    fasta_paths: Vec<PathBuf>,
}
impl FastaDataset {
    /// Indexes `dir` with the [`DEFAULT_PREFIX`]
    pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Self::open(dir, DEFAULT_PREFIX)
    }

    /// Indexes the files of `dir` whose name starts with `prefix` and ends with `.fasta`
    ///
    /// Files are sorted by the first number following `prefix` in their name. Names
    /// without such a number sort before every numbered file.
    pub fn open<P: AsRef<Path>>(dir: P, prefix: &str) -> Result<Self> {
        let path = dir.as_ref().to_path_buf();
        if !path.is_dir() {
            return Err(DatasetError::NotADirectory(path.display().to_string()).into());
        }
        let pattern = Regex::new(&format!(r"{}(\d+)", regex::escape(prefix)))?;

        let mut fasta_paths = Vec::new();
        for entry in fs::read_dir(&path)? {
            let entry_path = entry?.path();
            let name = file_name(&entry_path);
            if name.starts_with(prefix) && name.ends_with(DATASET_EXTENSION) {
                fasta_paths.push(entry_path);
            }
        }
        // name order first so equal keys stay deterministic
        fasta_paths.sort();
        fasta_paths.sort_by_cached_key(|p| extract_number(&pattern, &file_name(p)));

        debug!(
            "Indexed {} files with prefix {prefix:?} in {}",
            fasta_paths.len(),
            path.display()
        );
        Ok(Self {
            path,
            prefix: prefix.to_string(),
            fasta_paths,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fasta_paths.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fasta_paths.is_empty()
    }

    /// Base name of the dataset directory
    #[must_use]
    pub fn name(&self) -> String {
        file_name(&self.path)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Sorted paths of every indexed file
    #[must_use]
    pub fn fasta_files(&self) -> &[PathBuf] {
        &self.fasta_paths
    }

    /// Loads the file at `index`; negative indices count from the end
    pub fn get(&self, index: isize) -> Result<FastaContent> {
        let len = self.len();
        let resolved = if index < 0 {
            len.checked_sub(index.unsigned_abs())
        } else {
            Some(index.unsigned_abs()).filter(|&idx| idx < len)
        };
        let Some(idx) = resolved else {
            return Err(DatasetError::OutOfRange(index, len).into());
        };
        FastaContent::load(&self.fasta_paths[idx])
    }

    /// Loads every file within `range`, clamped to the dataset size
    pub fn slice(&self, range: Range<usize>) -> Result<Vec<FastaContent>> {
        let end = range.end.min(self.len());
        let start = range.start.min(end);
        self.fasta_paths[start..end]
            .iter()
            .map(FastaContent::load)
            .collect()
    }

    /// Lazily loads every file in order
    pub fn iter(&self) -> impl Iterator<Item = Result<FastaContent>> + '_ {
        self.fasta_paths.iter().map(FastaContent::load)
    }
}

/// Sort key of the number following the prefix, `None` sorting first
///
/// Digits are compared without leading zeros, by count and then lexically, which
/// orders numbers of any size by value.
fn extract_number(pattern: &Regex, name: &str) -> Option<(usize, String)> {
    let digits = pattern.captures(name)?.get(1)?.as_str().trim_start_matches('0');
    Some((digits.len(), digits.to_string()))
}

/// Lists the FASTA-like files directly inside `dir`, sorted and without duplicates
pub fn list_fasta_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let name = file_name(&path);
        if FASTA_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
            files.push(path);
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}
