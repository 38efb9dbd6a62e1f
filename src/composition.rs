//! Empirical nucleotide composition of sequence collections
//!
//! Only the four canonical bases are counted (case-insensitively); ambiguity codes, gaps,
//! and any other character are ignored. Counting and normalization are split into
//! [`BaseCounts`] and [`BaseDistribution`] so counts from many files or threads can be
//! merged before the distribution is derived.

use std::fmt;

use crate::error::{DistributionError, Result};

/// The canonical bases in the fixed order used by every weight array
pub const CANONICAL_BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// Returns the position of a canonical base in [`CANONICAL_BASES`], ignoring case
#[inline]
#[must_use]
pub fn base_index(base: u8) -> Option<usize> {
    match base.to_ascii_uppercase() {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}

/// Raw counts of canonical bases
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BaseCounts {
    counts: [u64; 4],
}
impl BaseCounts {
    /// Counts canonical bases over a collection of sequences
    pub fn from_sequences<I, S>(sequences: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counts = Self::default();
        for sequence in sequences {
            counts.add_sequence(sequence.as_ref());
        }
        counts
    }

    /// Adds the canonical bases of a single sequence
    pub fn add_sequence(&mut self, sequence: &str) {
        for idx in sequence.bytes().filter_map(base_index) {
            self.counts[idx] += 1;
        }
    }

    /// Adds the counts of another aggregate into this one
    pub fn merge(&mut self, other: &Self) {
        self.counts
            .iter_mut()
            .zip(other.counts)
            .for_each(|(x, y)| *x += y);
    }

    /// Returns the count of a canonical base, or zero for any other symbol
    #[must_use]
    pub fn count(&self, base: u8) -> u64 {
        base_index(base).map_or(0, |idx| self.counts[idx])
    }

    /// Total number of canonical bases observed
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Sampling weights over A, C, G, T summing to one
///
/// All four weights are always present. When no canonical base was observed the
/// distribution is uniform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseDistribution {
    weights: [f64; 4],
}
impl Default for BaseDistribution {
    fn default() -> Self {
        Self::uniform()
    }
}
impl BaseDistribution {
    /// The uniform distribution, 0.25 for every base
    #[must_use]
    pub fn uniform() -> Self {
        Self {
            weights: [0.25; 4],
        }
    }

    /// Builds a distribution from raw weights in A, C, G, T order
    ///
    /// The weights are normalized to sum to one. Negative, NaN, or infinite weights,
    /// and weights summing to zero, are rejected.
    pub fn new(weights: [f64; 4]) -> Result<Self> {
        let total: f64 = weights.iter().sum();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) || total <= 0.0 || !total.is_finite()
        {
            return Err(DistributionError::InvalidWeights(weights).into());
        }
        Ok(Self {
            weights: weights.map(|w| w / total),
        })
    }

    /// Derives the distribution from observed counts, falling back to uniform when empty
    #[must_use]
    pub fn from_counts(counts: &BaseCounts) -> Self {
        let total = counts.total();
        if total == 0 {
            return Self::uniform();
        }
        Self {
            weights: counts.counts.map(|c| c as f64 / total as f64),
        }
    }

    /// Returns the weight of a canonical base, or zero for any other symbol
    #[must_use]
    pub fn weight(&self, base: u8) -> f64 {
        base_index(base).map_or(0.0, |idx| self.weights[idx])
    }

    /// Returns the weights in A, C, G, T order
    #[must_use]
    pub fn weights(&self) -> [f64; 4] {
        self.weights
    }

    /// Exact bit pattern of the weights, used as a hashable identity
    #[must_use]
    pub(crate) fn key(&self) -> [u64; 4] {
        self.weights.map(f64::to_bits)
    }
}
impl fmt::Display for BaseDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, c, g, t] = self.weights;
        write!(f, "A:{a:.4} C:{c:.4} G:{g:.4} T:{t:.4}")
    }
}

/// Computes the canonical base distribution over a collection of sequences
///
/// Returns the uniform distribution if the collection holds no canonical base.
pub fn compute_distribution<I, S>(sequences: I) -> BaseDistribution
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    BaseDistribution::from_counts(&BaseCounts::from_sequences(sequences))
}
