//! # seqprep
//!
//! Preprocessing of FASTA datasets for multiple sequence alignment benchmarks.
//!
//! The crate covers the steps applied to a dataset before it is handed to aligners:
//!
//! * [`fasta`]: permissive FASTA parsing and wrapped serialization
//! * [`composition`]: empirical A/C/G/T distribution of a collection
//! * [`ambiguity`]: composition-weighted resolution of IUPAC ambiguity codes
//! * [`cut`]: randomized cut lengths for long sequences
//! * [`dedup`]: removal and reporting of duplicate sequences
//! * [`dataset`]: indexed access to directories of numbered FASTA files
//! * [`parallel`] and [`pipeline`]: running all of the above over a dataset
//!
//! Every sampling operation takes its random source as an argument, so runs are
//! reproducible with a seeded generator.
//!
//! ```
//! use rand::{rngs::SmallRng, SeedableRng};
//! use seqprep::{ambiguity, composition, dedup, fasta, Result};
//!
//! fn main() -> Result<()> {
//!     let records = fasta::parse_str(">s1\nACGT\n>s2\nRRRR\n>s3\nACGT\n");
//!     let distribution = composition::compute_distribution(["ACGT"]);
//!
//!     let mut rng = SmallRng::seed_from_u64(seqprep::RNG_SEED);
//!     let resolved: Vec<_> = records
//!         .iter()
//!         .map(|r| r.with_sequence(ambiguity::resolve_sequence(&r.sequence, &distribution, &mut rng)))
//!         .collect();
//!
//!     let unique = dedup::deduplicate(&resolved);
//!     assert_eq!(unique.len(), 2);
//!     print!("{}", fasta::serialize(&unique, fasta::WRAP_DEFAULT)?);
//!     Ok(())
//! }
//! ```

pub mod ambiguity;
pub mod composition;
pub mod cut;
pub mod dataset;
pub mod dedup;
mod error;
pub mod fasta;
pub mod parallel;
pub mod pipeline;
mod record;

pub use ambiguity::{resolve_sequence, AmbiguityResolver};
pub use composition::{compute_distribution, BaseCounts, BaseDistribution};
pub use cut::{derive_cut_length, CutBounds, TruncateFrom};
pub use dataset::{FastaContent, FastaDataset};
pub use dedup::{deduplicate, find_duplicates};
pub use error::{DatasetError, DistributionError, Error, FormatError, ReadError, Result};
pub use parallel::{ParallelProcessor, ParallelReader};
pub use record::{sequences, Record, RecordCollection};

/// Default seed for reproducible sampling
pub const RNG_SEED: u64 = 42;
