//! Resolution of IUPAC ambiguity codes into concrete bases
//!
//! Every ambiguity symbol is replaced by one of its candidate bases, drawn with
//! probability proportional to a [`BaseDistribution`] restricted to the candidates.
//! The random source is always passed in explicitly, so a seeded generator gives
//! reproducible output.
//!
//! ```
//! use rand::{rngs::SmallRng, SeedableRng};
//! use seqprep::{ambiguity::resolve_sequence, BaseDistribution, Result};
//!
//! fn main() -> Result<()> {
//!     let only_a = BaseDistribution::new([1.0, 0.0, 0.0, 0.0])?;
//!     let mut rng = SmallRng::seed_from_u64(42);
//!     assert_eq!(resolve_sequence("ACRr-", &only_a, &mut rng), "ACAa-");
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;
use rand::{
    distr::{weighted::WeightedIndex, Distribution},
    Rng,
};

use crate::{
    composition::BaseDistribution,
    error::{DistributionError, Result},
};

/// IUPAC ambiguity symbols and their candidate bases
pub const AMBIGUITY_TABLE: [(u8, &[u8]); 10] = [
    (b'R', b"AG"),
    (b'Y', b"CT"),
    (b'S', b"GC"),
    (b'W', b"AT"),
    (b'K', b"GT"),
    (b'M', b"AC"),
    (b'B', b"CGT"),
    (b'D', b"AGT"),
    (b'H', b"ACT"),
    (b'V', b"ACG"),
];

/// Returns the candidate bases of an ambiguity symbol, ignoring case
#[must_use]
pub fn candidates(symbol: u8) -> Option<&'static [u8]> {
    let upper = symbol.to_ascii_uppercase();
    AMBIGUITY_TABLE
        .iter()
        .find(|(s, _)| *s == upper)
        .map(|(_, bases)| *bases)
}

/// Uppercase ambiguity symbol of a character, if it is one
///
/// Follows the full Unicode uppercase mapping, so characters whose single-character
/// uppercase form is an ambiguity code count as that code.
fn ambiguity_symbol(c: char) -> Option<u8> {
    let mut upper = c.to_uppercase();
    let (Some(u), None) = (upper.next(), upper.next()) else {
        return None;
    };
    u8::try_from(u).ok().filter(|&b| candidates(b).is_some())
}

/// Returns true if the character is a recognized ambiguity symbol
#[must_use]
pub fn is_ambiguous(symbol: char) -> bool {
    ambiguity_symbol(symbol).is_some()
}

/// Counts the positions of a sequence holding an ambiguity symbol
#[must_use]
pub fn count_ambiguous(sequence: &str) -> usize {
    sequence.chars().filter(|&c| is_ambiguous(c)).count()
}

/// Candidate bases of one symbol with weights normalized over just those candidates
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolWeights {
    bases: &'static [u8],
    weights: Vec<f64>,
    index: WeightedIndex<f64>,
}
impl SymbolWeights {
    /// Restricts `distribution` to `bases` and renormalizes
    ///
    /// Falls back to a uniform choice when the restricted weights sum to zero.
    pub fn new(bases: &'static [u8], distribution: &BaseDistribution) -> Result<Self> {
        let raw: Vec<f64> = bases.iter().map(|&b| distribution.weight(b)).collect();
        let total: f64 = raw.iter().sum();
        let weights: Vec<f64> = if total > 0.0 {
            raw.iter().map(|w| w / total).collect()
        } else {
            vec![1.0 / bases.len() as f64; bases.len()]
        };
        let index = WeightedIndex::new(&weights).map_err(DistributionError::from)?;
        Ok(Self {
            bases,
            weights,
            index,
        })
    }

    #[must_use]
    pub fn bases(&self) -> &[u8] {
        self.bases
    }

    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Draws one candidate base (uppercase)
    pub fn sample<R: Rng>(&self, rng: &mut R) -> u8 {
        self.bases[self.index.sample(rng)]
    }
}

/// Process-shareable cache of [`SymbolWeights`] keyed by symbol and exact distribution
///
/// Entries are never mutated once inserted, so readers only contend on insertion.
#[derive(Debug, Default)]
pub struct WeightCache {
    inner: RwLock<HashMap<(u8, [u64; 4]), Arc<SymbolWeights>>>,
}
impl WeightCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the weights for an (uppercase) symbol, computing them if absent
    ///
    /// Returns `None` if the symbol is not an ambiguity code. The weights of a validated
    /// [`BaseDistribution`] always form a samplable restriction, so that is the only
    /// case without an entry.
    pub fn get(&self, symbol: u8, distribution: &BaseDistribution) -> Option<Arc<SymbolWeights>> {
        let symbol = symbol.to_ascii_uppercase();
        let bases = candidates(symbol)?;
        let key = (symbol, distribution.key());
        if let Some(weights) = self.inner.read().get(&key) {
            return Some(Arc::clone(weights));
        }
        let computed = Arc::new(SymbolWeights::new(bases, distribution).ok()?);
        let mut guard = self.inner.write();
        Some(Arc::clone(guard.entry(key).or_insert(computed)))
    }

    /// Number of cached (symbol, distribution) entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }
}

/// Cache shared by every call to [`resolve_sequence`]
static GLOBAL_CACHE: LazyLock<WeightCache> = LazyLock::new(WeightCache::new);

fn resolve_with_cache<R: Rng>(
    cache: &WeightCache,
    sequence: &str,
    distribution: &BaseDistribution,
    rng: &mut R,
) -> String {
    sequence
        .chars()
        .map(|c| {
            let Some(weights) =
                ambiguity_symbol(c).and_then(|symbol| cache.get(symbol, distribution))
            else {
                return c;
            };
            let base = char::from(weights.sample(&mut *rng));
            if c.is_lowercase() {
                base.to_ascii_lowercase()
            } else {
                base
            }
        })
        .collect()
}

/// Replaces every ambiguity symbol of `sequence` with a base sampled from `distribution`
///
/// The replacement keeps the case of the original symbol. Any other character, including
/// canonical bases, gaps, and unknown symbols, is passed through unchanged.
pub fn resolve_sequence<R: Rng>(
    sequence: &str,
    distribution: &BaseDistribution,
    rng: &mut R,
) -> String {
    resolve_with_cache(&GLOBAL_CACHE, sequence, distribution, rng)
}

/// Ambiguity resolver owning its own weight cache
///
/// Clones share the same cache, so a resolver can be handed to several workers.
#[derive(Debug, Clone, Default)]
pub struct AmbiguityResolver {
    cache: Arc<WeightCache>,
}
impl AmbiguityResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// See [`resolve_sequence`]
    pub fn resolve<R: Rng>(
        &self,
        sequence: &str,
        distribution: &BaseDistribution,
        rng: &mut R,
    ) -> String {
        resolve_with_cache(&self.cache, sequence, distribution, rng)
    }

    #[must_use]
    pub fn cache(&self) -> &WeightCache {
        &self.cache
    }
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::composition::compute_distribution;
    use anyhow::Result;
    use rand::{rngs::SmallRng, SeedableRng};

    fn only_a() -> Result<BaseDistribution> {
        Ok(BaseDistribution::new([1.0, 0.0, 0.0, 0.0])?)
    }

    #[test]
    fn test_table() {
        assert_eq!(candidates(b'R'), Some(&b"AG"[..]));
        assert_eq!(candidates(b'v'), Some(&b"ACG"[..]));
        assert_eq!(candidates(b'N'), None);
        assert_eq!(candidates(b'A'), None);
        assert!(AMBIGUITY_TABLE
            .iter()
            .all(|(_, bases)| (2..=3).contains(&bases.len())));
    }

    #[test]
    fn test_zero_weight_base_never_drawn() -> Result<()> {
        let dist = only_a()?;
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..1000 {
            assert_eq!(resolve_sequence("R", &dist, &mut rng), "A");
            assert_eq!(resolve_sequence("r", &dist, &mut rng), "a");
        }
        Ok(())
    }

    #[test]
    fn test_non_ambiguous_passthrough() -> Result<()> {
        let dist = only_a()?;
        let mut rng = SmallRng::seed_from_u64(7);
        assert_eq!(resolve_sequence("A", &dist, &mut rng), "A");
        assert_eq!(resolve_sequence("-", &dist, &mut rng), "-");
        assert_eq!(
            resolve_sequence("acgtNn*.-\u{FFFD}", &dist, &mut rng),
            "acgtNn*.-\u{FFFD}"
        );
        Ok(())
    }

    #[test]
    fn test_zero_restricted_weights_fall_back_to_uniform() -> Result<()> {
        // Y = {C, T}, both weightless under this distribution
        let dist = only_a()?;
        let weights = SymbolWeights::new(b"CT", &dist)?;
        assert_eq!(weights.weights(), &[0.5, 0.5]);

        let mut rng = SmallRng::seed_from_u64(11);
        let resolved = resolve_sequence(&"Y".repeat(2000), &dist, &mut rng);
        let n_c = resolved.bytes().filter(|&b| b == b'C').count();
        assert!(resolved.bytes().all(|b| b == b'C' || b == b'T'));
        assert!((800..1200).contains(&n_c));
        Ok(())
    }

    #[test]
    fn test_renormalized_weights() -> Result<()> {
        let dist = BaseDistribution::new([0.1, 0.2, 0.3, 0.4])?;
        let weights = SymbolWeights::new(b"CGT", &dist)?;
        let expected = [2.0 / 9.0, 3.0 / 9.0, 4.0 / 9.0];
        for (w, e) in weights.weights().iter().zip(expected) {
            assert!((w - e).abs() < 1e-12);
        }
        Ok(())
    }

    #[test]
    fn test_seeded_reproducibility() {
        let dist = compute_distribution(["AAACGT"]);
        let sequence = "RYSWKMBDHVrysw".repeat(20);
        let first = resolve_sequence(&sequence, &dist, &mut SmallRng::seed_from_u64(42));
        let second = resolve_sequence(&sequence, &dist, &mut SmallRng::seed_from_u64(42));
        assert_eq!(first, second);
        assert_eq!(count_ambiguous(&first), 0);
        assert_eq!(first.len(), sequence.len());
    }

    #[test]
    fn test_resolution_stays_within_candidates() {
        let dist = BaseDistribution::uniform();
        let mut rng = SmallRng::seed_from_u64(3);
        for (symbol, bases) in AMBIGUITY_TABLE {
            let sequence = char::from(symbol).to_string().repeat(50);
            let resolved = resolve_sequence(&sequence, &dist, &mut rng);
            assert!(resolved.bytes().all(|b| bases.contains(&b)));
        }
    }

    #[test]
    fn test_cache_keyed_per_distribution() -> Result<()> {
        let resolver = AmbiguityResolver::new();
        let mut rng = SmallRng::seed_from_u64(5);
        let a = only_a()?;
        let g = BaseDistribution::new([0.0, 0.0, 1.0, 0.0])?;

        assert_eq!(resolver.resolve("RRR", &a, &mut rng), "AAA");
        assert_eq!(resolver.resolve("RRR", &g, &mut rng), "GGG");
        assert_eq!(resolver.resolve("rr", &a, &mut rng), "aa");
        assert_eq!(resolver.cache().len(), 2);

        let shared = resolver.clone();
        shared.resolve("Y", &a, &mut rng);
        assert_eq!(resolver.cache().len(), 3);

        resolver.cache().clear();
        assert!(resolver.cache().is_empty());
        Ok(())
    }

    #[test]
    fn test_unicode_uppercase_symbol() -> Result<()> {
        // U+017F (long s) uppercases to 'S'
        let dist = BaseDistribution::new([0.0, 0.0, 1.0, 0.0])?;
        let mut rng = SmallRng::seed_from_u64(13);
        assert!(is_ambiguous('\u{17F}'));
        assert_eq!(resolve_sequence("\u{17F}S", &dist, &mut rng), "gG");
        // multi-character uppercase forms are not symbols
        assert!(!is_ambiguous('\u{DF}'));
        assert_eq!(resolve_sequence("\u{DF}", &dist, &mut rng), "\u{DF}");
        Ok(())
    }

    #[test]
    fn test_shared_cache_across_threads() -> Result<()> {
        let resolver = AmbiguityResolver::new();
        let dists = [
            BaseDistribution::new([0.4, 0.1, 0.1, 0.4])?,
            BaseDistribution::new([0.1, 0.4, 0.4, 0.1])?,
        ];
        let sequence = "RYSWKMBDHV".repeat(30);

        let handles: Vec<_> = (0..8u64)
            .map(|tid| {
                let resolver = resolver.clone();
                let dist = dists[(tid % 2) as usize];
                let sequence = sequence.clone();
                std::thread::spawn(move || {
                    let mut rng = SmallRng::seed_from_u64(tid);
                    (0..20)
                        .map(|_| resolver.resolve(&sequence, &dist, &mut rng))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        for handle in handles {
            let outputs = handle.join().map_err(|_| anyhow::anyhow!("worker panicked"))?;
            for resolved in outputs {
                for (symbol, base) in sequence.bytes().zip(resolved.bytes()) {
                    assert!(candidates(symbol).is_some_and(|bases| bases.contains(&base)));
                }
            }
        }
        // ten symbols under two distributions
        assert_eq!(resolver.cache().len(), 20);
        Ok(())
    }

    #[test]
    fn test_count_ambiguous() {
        assert_eq!(count_ambiguous("ACGTRYsw-N"), 4);
        assert_eq!(count_ambiguous(""), 0);
    }
}
