//! Dataset preprocessing pipeline
//!
//! Chains the core operations over every file of a [`FastaDataset`]:
//!
//! 1. ambiguity resolution, weighted by the file's (or the whole dataset's) composition
//! 2. randomized truncation of long sequences
//! 3. removal of duplicate sequences
//!
//! Each file gets its own random stream seeded from the configured seed and the file's
//! index, so the output does not depend on the number of threads.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info};
use parking_lot::Mutex;
use rand::{rngs::SmallRng, Rng, SeedableRng};

use crate::{
    ambiguity::{count_ambiguous, AmbiguityResolver},
    composition::{compute_distribution, BaseCounts, BaseDistribution},
    cut::{derive_cut_length, truncate, CutBounds, TruncateFrom},
    dataset::{FastaContent, FastaDataset},
    dedup::deduplicate_in_place,
    error::{FormatError, Result},
    fasta::{write_fasta_file, WRAP_DEFAULT},
    parallel::{ParallelProcessor, ParallelReader},
    Record, RecordCollection, RNG_SEED,
};

/// Which sequences the resolution distribution is computed over
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompositionScope {
    /// Each file is resolved with its own composition
    #[default]
    PerFile,
    /// Every file is resolved with the composition of the whole dataset
    Dataset,
}

/// Settings of a preprocessing run
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Replace IUPAC ambiguity codes with sampled bases
    pub resolve: bool,
    /// Sequences the resolution distribution is computed over
    pub scope: CompositionScope,
    /// Cut bounds and the side to remove characters from
    pub cut: Option<(CutBounds, TruncateFrom)>,
    /// Drop later records repeating an earlier sequence
    pub dedup: bool,
    /// Line width of written files
    pub width: usize,
    /// Base seed of the per-file random streams
    pub seed: u64,
}
impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            resolve: false,
            scope: CompositionScope::default(),
            cut: None,
            dedup: false,
            width: WRAP_DEFAULT,
            seed: RNG_SEED,
        }
    }
}

/// Builder for [`PreprocessConfig`]
///
/// # Examples
///
/// ```
/// # use seqprep::{Result, cut::{CutBounds, TruncateFrom}, pipeline::PreprocessConfigBuilder};
/// # fn main() -> Result<()> {
/// let config = PreprocessConfigBuilder::default()
///     .resolve(true)
///     .cut(CutBounds::new(100, 10), TruncateFrom::End)
///     .dedup(true)
///     .seed(7)
///     .build()?;
/// assert!(config.resolve);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct PreprocessConfigBuilder {
    config: PreprocessConfig,
}
impl PreprocessConfigBuilder {
    #[must_use]
    pub fn resolve(mut self, resolve: bool) -> Self {
        self.config.resolve = resolve;
        self
    }

    #[must_use]
    pub fn scope(mut self, scope: CompositionScope) -> Self {
        self.config.scope = scope;
        self
    }

    #[must_use]
    pub fn cut(mut self, bounds: CutBounds, from: TruncateFrom) -> Self {
        self.config.cut = Some((bounds, from));
        self
    }

    #[must_use]
    pub fn dedup(mut self, dedup: bool) -> Self {
        self.config.dedup = dedup;
        self
    }

    #[must_use]
    pub fn width(mut self, width: usize) -> Self {
        self.config.width = width;
        self
    }

    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn build(self) -> Result<PreprocessConfig> {
        if self.config.width == 0 {
            return Err(FormatError::InvalidWidth(0).into());
        }
        Ok(self.config)
    }
}

/// Counts gathered while preprocessing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub files: usize,
    pub records_in: usize,
    pub records_out: usize,
    /// Ambiguity symbols replaced by a sampled base
    pub resolved_positions: usize,
    /// Sequences shortened by the cut step
    pub sequences_cut: usize,
}
impl PipelineReport {
    pub fn merge(&mut self, other: &Self) {
        self.files += other.files;
        self.records_in += other.records_in;
        self.records_out += other.records_out;
        self.resolved_positions += other.resolved_positions;
        self.sequences_cut += other.sequences_cut;
    }

    /// Records dropped as duplicates
    #[must_use]
    pub fn duplicates_removed(&self) -> usize {
        self.records_in - self.records_out
    }
}

/// Applies a [`PreprocessConfig`] to record collections and datasets
#[derive(Debug, Clone)]
pub struct Preprocessor {
    config: PreprocessConfig,
    resolver: AmbiguityResolver,
}
impl Preprocessor {
    #[must_use]
    pub fn new(config: PreprocessConfig) -> Self {
        Self {
            config,
            resolver: AmbiguityResolver::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &PreprocessConfig {
        &self.config
    }

    /// Random stream of the file at `index`
    #[must_use]
    pub fn rng_for(&self, index: usize) -> SmallRng {
        SmallRng::seed_from_u64(self.config.seed.wrapping_add(index as u64))
    }

    /// Resolves and cuts every record, then deduplicates the collection
    pub fn process_records<R: Rng>(
        &self,
        records: &[Record],
        distribution: &BaseDistribution,
        rng: &mut R,
    ) -> (RecordCollection, PipelineReport) {
        let mut report = PipelineReport {
            records_in: records.len(),
            ..PipelineReport::default()
        };

        let mut processed: RecordCollection = records
            .iter()
            .map(|record| {
                let mut sequence = if self.config.resolve {
                    report.resolved_positions += count_ambiguous(&record.sequence);
                    self.resolver.resolve(&record.sequence, distribution, &mut *rng)
                } else {
                    record.sequence.clone()
                };
                if let Some((bounds, from)) = self.config.cut {
                    let len = sequence.chars().count();
                    let target = derive_cut_length(len, bounds, &mut *rng);
                    if target < len {
                        sequence = truncate(&sequence, target, from);
                        report.sequences_cut += 1;
                    }
                }
                record.with_sequence(sequence)
            })
            .collect();

        if self.config.dedup {
            deduplicate_in_place(&mut processed);
        }
        report.records_out = processed.len();
        (processed, report)
    }

    /// Distribution used to resolve `content`, or `None` when resolution is off
    fn file_distribution(
        &self,
        content: &FastaContent,
        shared: Option<&BaseDistribution>,
    ) -> Option<BaseDistribution> {
        if !self.config.resolve {
            return None;
        }
        Some(shared.copied().unwrap_or_else(|| compute_distribution(content.sequences())))
    }

    /// Processes one parsed file, writing the result into `out_dir` under the same name
    fn process_content(
        &self,
        index: usize,
        content: &FastaContent,
        distribution: Option<&BaseDistribution>,
        out_dir: &Path,
    ) -> Result<PipelineReport> {
        let distribution = self
            .file_distribution(content, distribution)
            .unwrap_or_default();
        let mut rng = self.rng_for(index);
        let (records, mut report) = self.process_records(content.records(), &distribution, &mut rng);
        write_fasta_file(out_dir.join(content.name()), &records, self.config.width)?;
        report.files = 1;
        debug!(
            "{}: {} -> {} records ({} resolved, {} cut)",
            content.name(),
            report.records_in,
            report.records_out,
            report.resolved_positions,
            report.sequences_cut
        );
        Ok(report)
    }

    /// Preprocesses every file of `dataset` into `out_dir`
    ///
    /// `num_threads == 0` uses every CPU.
    pub fn run_dataset<P: AsRef<Path>>(
        &self,
        dataset: &FastaDataset,
        out_dir: P,
        num_threads: usize,
    ) -> Result<PipelineReport> {
        let out_dir = out_dir.as_ref().to_path_buf();
        fs::create_dir_all(&out_dir)?;

        let distribution = if self.config.resolve && self.config.scope == CompositionScope::Dataset
        {
            let dist = dataset_distribution(dataset, num_threads)?;
            info!("Dataset composition: {dist}");
            Some(dist)
        } else {
            None
        };

        let report = Arc::new(Mutex::new(PipelineReport::default()));
        let processor = FileProcessor {
            preprocessor: self.clone(),
            distribution,
            out_dir,
            local: PipelineReport::default(),
            report: Arc::clone(&report),
        };
        dataset.clone().process_parallel(processor, num_threads)?;

        let report = *report.lock();
        info!(
            "Processed {} files: {} -> {} records, {} positions resolved, {} sequences cut",
            report.files,
            report.records_in,
            report.records_out,
            report.resolved_positions,
            report.sequences_cut
        );
        Ok(report)
    }
}

/// Writes each processed file and accumulates a shared report
#[derive(Clone)]
struct FileProcessor {
    preprocessor: Preprocessor,
    distribution: Option<BaseDistribution>,
    out_dir: PathBuf,
    local: PipelineReport,
    report: Arc<Mutex<PipelineReport>>,
}
impl ParallelProcessor for FileProcessor {
    fn process_file(&mut self, index: usize, content: FastaContent) -> Result<()> {
        let report = self.preprocessor.process_content(
            index,
            &content,
            self.distribution.as_ref(),
            &self.out_dir,
        )?;
        self.local.merge(&report);
        Ok(())
    }

    fn on_batch_complete(&mut self) -> Result<()> {
        self.report.lock().merge(&self.local);
        self.local = PipelineReport::default();
        Ok(())
    }
}

/// Counts canonical bases per thread and merges them on batch completion
#[derive(Clone, Default)]
struct CompositionCounter {
    local: BaseCounts,
    counts: Arc<Mutex<BaseCounts>>,
}
impl ParallelProcessor for CompositionCounter {
    fn process_file(&mut self, _index: usize, content: FastaContent) -> Result<()> {
        for sequence in content.sequences() {
            self.local.add_sequence(sequence);
        }
        Ok(())
    }

    fn on_batch_complete(&mut self) -> Result<()> {
        self.counts.lock().merge(&self.local);
        self.local = BaseCounts::default();
        Ok(())
    }
}

/// Computes the base distribution over every sequence of a dataset
pub fn dataset_distribution(dataset: &FastaDataset, num_threads: usize) -> Result<BaseDistribution> {
    let counter = CompositionCounter::default();
    dataset.clone().process_parallel(counter.clone(), num_threads)?;
    let counts = *counter.counts.lock();
    Ok(BaseDistribution::from_counts(&counts))
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::fasta::{parse_str, read_fasta_file};
    use anyhow::Result;

    fn write_dataset(files: &[(&str, &str)]) -> Result<(tempfile::TempDir, FastaDataset)> {
        let dir = tempfile::tempdir()?;
        let data = dir.path().join("data");
        fs::create_dir(&data)?;
        for (name, content) in files {
            fs::write(data.join(name), content)?;
        }
        let dataset = FastaDataset::new(&data)?;
        Ok((dir, dataset))
    }

    #[test]
    fn test_end_to_end_scenario() {
        let records = parse_str(">s1\nACGT\n>s2\nRYSW\n");
        assert_eq!(records.len(), 2);

        let distribution = compute_distribution([records[0].sequence()]);
        assert_eq!(distribution, BaseDistribution::uniform());

        let allowed: [&[u8]; 4] = [b"AG", b"CT", b"GC", b"AT"];
        let mut rng = SmallRng::seed_from_u64(RNG_SEED);
        for _ in 0..200 {
            let resolved =
                crate::ambiguity::resolve_sequence(records[1].sequence(), &distribution, &mut rng);
            assert_eq!(resolved.len(), 4);
            for (b, options) in resolved.bytes().zip(allowed) {
                assert!(options.contains(&b));
            }
        }
    }

    #[test]
    fn test_builder_rejects_zero_width() {
        assert!(PreprocessConfigBuilder::default().width(0).build().is_err());
    }

    #[test]
    fn test_process_records() -> Result<()> {
        let config = PreprocessConfigBuilder::default()
            .resolve(true)
            .cut(CutBounds::new(4, 0), TruncateFrom::End)
            .dedup(true)
            .build()?;
        let preprocessor = Preprocessor::new(config);
        let only_a = BaseDistribution::new([1.0, 0.0, 0.0, 0.0])?;
        let records = vec![
            Record::new("h1", "RRAACC"),
            Record::new("h2", "AAAAGG"),
            Record::new("h3", "ACG"),
            Record::new("h4", "ACG"),
        ];

        let (out, report) =
            preprocessor.process_records(&records, &only_a, &mut preprocessor.rng_for(0));
        assert_eq!(
            out,
            vec![Record::new("h1", "AAAA"), Record::new("h3", "ACG")]
        );
        assert_eq!(
            report,
            PipelineReport {
                files: 0,
                records_in: 4,
                records_out: 2,
                resolved_positions: 2,
                sequences_cut: 2,
            }
        );
        assert_eq!(report.duplicates_removed(), 2);
        Ok(())
    }

    #[test]
    fn test_passthrough_by_default() -> Result<()> {
        let preprocessor = Preprocessor::new(PreprocessConfig::default());
        let records = vec![Record::new("a", "RYN"), Record::new("b", "RYN")];
        let (out, report) = preprocessor.process_records(
            &records,
            &BaseDistribution::uniform(),
            &mut preprocessor.rng_for(0),
        );
        assert_eq!(out, records);
        assert_eq!(report.resolved_positions, 0);
        Ok(())
    }

    #[test]
    fn test_composition_only_when_resolving() -> Result<()> {
        let (_dir, dataset) = write_dataset(&[("test1.fasta", ">a\nAAAC\n")])?;
        let content = dataset.get(0)?;
        let only_g = BaseDistribution::new([0.0, 0.0, 1.0, 0.0])?;

        let passthrough = Preprocessor::new(PreprocessConfig::default());
        assert_eq!(passthrough.file_distribution(&content, None), None);
        assert_eq!(passthrough.file_distribution(&content, Some(&only_g)), None);

        let config = PreprocessConfigBuilder::default().resolve(true).build()?;
        let resolving = Preprocessor::new(config);
        assert_eq!(
            resolving.file_distribution(&content, None),
            Some(BaseDistribution::new([0.75, 0.0, 0.0, 0.25])?)
        );
        assert_eq!(resolving.file_distribution(&content, Some(&only_g)), Some(only_g));
        Ok(())
    }

    #[test]
    fn test_run_dataset() -> Result<()> {
        let (dir, dataset) = write_dataset(&[
            ("test1.fasta", ">a\nAAAARY\n>b\nAAAARY\n"),
            ("test2.fasta", ">c\nCCCCCCCCCCCCCCCCS\n"),
            ("test3.fasta", ">d\nNNNN\n"),
        ])?;
        let out_dir = dir.path().join("out");
        let config = PreprocessConfigBuilder::default()
            .resolve(true)
            .cut(CutBounds::new(8, 2), TruncateFrom::End)
            .width(4)
            .build()?;
        let preprocessor = Preprocessor::new(config);

        let report = preprocessor.run_dataset(&dataset, &out_dir, 2)?;
        assert_eq!(report.files, 3);
        assert_eq!(report.records_in, 4);
        assert_eq!(report.records_out, 4);
        assert_eq!(report.resolved_positions, 5);
        assert_eq!(report.sequences_cut, 1);

        // only A observed in the first file, so R -> A; Y falls back to uniform {C, T}
        let first = read_fasta_file(out_dir.join("test1.fasta"))?;
        for record in &first {
            assert!(record.sequence == "AAAAAC" || record.sequence == "AAAAAT");
        }

        let second = read_fasta_file(out_dir.join("test2.fasta"))?;
        assert!((6..=8).contains(&second[0].sequence.len()));
        assert!(second[0].sequence.bytes().all(|b| b == b'C'));

        let raw = fs::read_to_string(out_dir.join("test3.fasta"))?;
        assert_eq!(raw, ">d\nNNNN\n");
        Ok(())
    }

    #[test]
    fn test_run_dataset_independent_of_threads() -> Result<()> {
        let files: Vec<(String, String)> = (0..6)
            .map(|i| (format!("test{i}.fasta"), format!(">s{i}\nACGTRYSWKMBDHV{i}\n")))
            .collect();
        let borrowed: Vec<(&str, &str)> = files
            .iter()
            .map(|(n, c)| (n.as_str(), c.as_str()))
            .collect();
        let (dir, dataset) = write_dataset(&borrowed)?;
        let config = PreprocessConfigBuilder::default().resolve(true).seed(99).build()?;
        let preprocessor = Preprocessor::new(config);

        preprocessor.run_dataset(&dataset, dir.path().join("one"), 1)?;
        preprocessor.run_dataset(&dataset, dir.path().join("many"), 4)?;
        for (name, _) in &files {
            assert_eq!(
                fs::read_to_string(dir.path().join("one").join(name))?,
                fs::read_to_string(dir.path().join("many").join(name))?
            );
        }
        Ok(())
    }

    #[test]
    fn test_dataset_scope() -> Result<()> {
        let (dir, dataset) = write_dataset(&[
            ("test1.fasta", ">a\nGGGG\n"),
            ("test2.fasta", ">b\nRRRR\n"),
        ])?;
        assert_eq!(
            dataset_distribution(&dataset, 2)?,
            BaseDistribution::new([0.0, 0.0, 1.0, 0.0])?
        );

        let config = PreprocessConfigBuilder::default()
            .resolve(true)
            .scope(CompositionScope::Dataset)
            .build()?;
        Preprocessor::new(config).run_dataset(&dataset, dir.path().join("out"), 0)?;
        let resolved = read_fasta_file(dir.path().join("out").join("test2.fasta"))?;
        assert_eq!(resolved[0].sequence, "GGGG");
        Ok(())
    }
}
