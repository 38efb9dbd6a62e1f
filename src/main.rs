use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;

use seqprep::{
    dedup::find_duplicates,
    fasta::{read_fasta_file, WRAP_DEFAULT},
    pipeline::{CompositionScope, PreprocessConfigBuilder, Preprocessor},
    BaseCounts, BaseDistribution, CutBounds, FastaDataset, TruncateFrom, RNG_SEED,
};

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Preprocess every `<prefix><N>.fasta` file of a dataset directory
    Prepare(PrepareArgs),
    /// Report sequences occurring more than once in a FASTA file
    Duplicates {
        /// FASTA file
        input: PathBuf,
    },
    /// Print the pooled A/C/G/T distribution of FASTA files
    Composition {
        /// FASTA files
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum CutSide {
    /// Remove leading characters
    Start,
    /// Remove trailing characters
    End,
}
impl From<CutSide> for TruncateFrom {
    fn from(side: CutSide) -> Self {
        match side {
            CutSide::Start => TruncateFrom::Start,
            CutSide::End => TruncateFrom::End,
        }
    }
}

#[derive(Debug, Args)]
struct PrepareArgs {
    /// Dataset directory
    input: PathBuf,

    /// Output directory (created if missing)
    #[arg(short, long)]
    output: PathBuf,

    /// File-name prefix of dataset files
    #[arg(short, long, default_value = seqprep::dataset::DEFAULT_PREFIX)]
    prefix: String,

    /// Replace IUPAC ambiguity codes with bases sampled from the composition
    #[arg(short, long)]
    resolve: bool,

    /// Use the composition of the whole dataset instead of each file's
    #[arg(long, requires = "resolve")]
    dataset_composition: bool,

    /// Cut sequences longer than this length
    #[arg(short = 'k', long, requires = "cut_from")]
    cut_length: Option<usize>,

    /// How far below the cut length a cut may land
    #[arg(short = 'm', long, default_value_t = 0)]
    cut_margin: usize,

    /// Side of the sequence to remove characters from
    #[arg(long, value_enum, requires = "cut_length")]
    cut_from: Option<CutSide>,

    /// Remove later records repeating an earlier sequence
    #[arg(short, long)]
    dedup: bool,

    /// Line width of written sequences
    #[arg(short, long, default_value_t = WRAP_DEFAULT)]
    width: usize,

    /// Seed of the random streams
    #[arg(short, long, default_value_t = RNG_SEED)]
    seed: u64,

    /// Number of threads (0 = all CPUs)
    #[arg(short = 'T', long, default_value_t = 0)]
    threads: usize,
}

fn prepare(args: &PrepareArgs) -> Result<()> {
    let dataset = FastaDataset::open(&args.input, &args.prefix)
        .with_context(|| format!("Failed to index dataset: {}", args.input.display()))?;
    if dataset.is_empty() {
        bail!(
            "No `{}<N>.fasta` files found in {}",
            args.prefix,
            args.input.display()
        );
    }
    if args.output.canonicalize().ok() == Some(args.input.canonicalize()?) {
        bail!("Output directory must differ from the dataset directory");
    }
    info!("Dataset {} holds {} files", dataset.name(), dataset.len());

    let mut builder = PreprocessConfigBuilder::default()
        .resolve(args.resolve)
        .dedup(args.dedup)
        .width(args.width)
        .seed(args.seed);
    if args.dataset_composition {
        builder = builder.scope(CompositionScope::Dataset);
    }
    if let (Some(k), Some(side)) = (args.cut_length, args.cut_from) {
        builder = builder.cut(CutBounds::new(k, args.cut_margin), side.into());
    }
    let preprocessor = Preprocessor::new(builder.build()?);

    let report = preprocessor.run_dataset(&dataset, &args.output, args.threads)?;
    println!(
        "files: {}\nrecords in: {}\nrecords out: {}\nduplicates removed: {}\npositions resolved: {}\nsequences cut: {}",
        report.files,
        report.records_in,
        report.records_out,
        report.duplicates_removed(),
        report.resolved_positions,
        report.sequences_cut
    );
    Ok(())
}

fn duplicates(input: &Path) -> Result<()> {
    let records = read_fasta_file(input)
        .with_context(|| format!("Failed to read FASTA file: {}", input.display()))?;
    let mut dups: Vec<(&str, usize)> = find_duplicates(&records).into_iter().collect();
    dups.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    info!("{} distinct duplicated sequences", dups.len());
    for (sequence, count) in dups {
        println!("{count}\t{sequence}");
    }
    Ok(())
}

fn composition(inputs: &[PathBuf]) -> Result<()> {
    let mut counts = BaseCounts::default();
    for input in inputs {
        let records = read_fasta_file(input)
            .with_context(|| format!("Failed to read FASTA file: {}", input.display()))?;
        counts.merge(&BaseCounts::from_sequences(seqprep::sequences(&records)));
    }
    info!("{} canonical bases counted", counts.total());
    println!("{}", BaseDistribution::from_counts(&counts));
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match &cli.command {
        Command::Prepare(args) => prepare(args),
        Command::Duplicates { input } => duplicates(input),
        Command::Composition { inputs } => composition(inputs),
    }
}
