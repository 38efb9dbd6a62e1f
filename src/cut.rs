//! Randomized cut lengths for truncating long sequences
//!
//! [`derive_cut_length`] only decides *how long* a sequence should become. Which end
//! is removed is always chosen by the caller through [`TruncateFrom`].

use rand::Rng;

/// Target length `k` and allowed shrink margin `h`
///
/// A cut length is drawn from the closed interval `[max(1, k - h), k]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutBounds {
    /// Target (maximum) length
    pub k: usize,
    /// How far below `k` a cut may land
    pub h: usize,
}
impl CutBounds {
    #[must_use]
    pub fn new(k: usize, h: usize) -> Self {
        Self { k, h }
    }

    /// Lower end of the interval before clamping against the sequence length
    #[must_use]
    pub fn min_len(&self) -> usize {
        self.k.saturating_sub(self.h).max(1)
    }
}

/// Side of a sequence that characters are removed from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TruncateFrom {
    /// Remove leading characters, keeping the suffix
    Start,
    /// Remove trailing characters, keeping the prefix
    End,
}

/// Derives the length a sequence of `orig_len` characters should be cut to
///
/// Sequences no longer than `bounds.k` keep their length. Otherwise the result is drawn
/// uniformly from `[max(1, k - h), min(k, orig_len)]`, with the lower end clamped down
/// to the upper one. The result never exceeds `orig_len` and is at least 1 unless
/// `k == 0`, in which case it is 0.
pub fn derive_cut_length<R: Rng>(orig_len: usize, bounds: CutBounds, rng: &mut R) -> usize {
    if orig_len <= bounds.k {
        return orig_len;
    }
    let max_len = bounds.k.min(orig_len);
    let min_len = bounds.min_len().min(max_len);
    rng.random_range(min_len..=max_len)
}

/// Truncates `sequence` to `len` characters, removing from the given side
///
/// Sequences already at most `len` characters long are returned unchanged.
#[must_use]
pub fn truncate(sequence: &str, len: usize, from: TruncateFrom) -> String {
    let total = sequence.chars().count();
    if total <= len {
        return sequence.to_string();
    }
    match from {
        TruncateFrom::End => sequence.chars().take(len).collect(),
        TruncateFrom::Start => sequence.chars().skip(total - len).collect(),
    }
}
