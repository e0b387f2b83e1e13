use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use minipart_lib::{parse_path, BuildConfig, ParseData};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "minipart")]
#[command(version)]
#[command(about = "Partition DNA sequences into minimizer-grouped super-k-mers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct BuildArgs {
    /// Input file: alternating header/sequence lines, optionally gzipped
    #[arg(short, long)]
    input: PathBuf,

    /// K-mer length (odd, at most 63)
    #[arg(short)]
    k: u64,

    /// Minimizer length (odd, at most min(k, 31))
    #[arg(short)]
    m: u64,

    /// Seed for the minimizer hash
    #[arg(short, long, default_value = "1")]
    seed: u64,

    /// Use canonical k-mers (k-mer or reverse complement, whichever has the
    /// smaller minimizer)
    #[arg(long, default_value = "false")]
    canonical: bool,

    /// Headers carry per-k-mer weights (LN:i: / ab:Z: fields)
    #[arg(long, default_value = "false")]
    weighted: bool,

    /// Directory for temporary spill files
    #[arg(long, default_value = ".")]
    tmp_dir: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Partition an input file and report statistics
    Parse {
        #[command(flatten)]
        args: BuildArgs,
    },

    /// Partition an input file, then verify the produced structures against
    /// the input
    Check {
        #[command(flatten)]
        args: BuildArgs,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing: use RUST_LOG if set, otherwise default to info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { args } => {
            let config = build_config(&args)?;
            let data = parse_path(&args.input, &config)?;
            print_summary(&data);
        }
        Commands::Check { args } => {
            let config = build_config(&args)?;
            let data = parse_path(&args.input, &config)?;
            print_summary(&data);
            check_command(&args.input, &config, &data)?;
        }
    }

    Ok(())
}

fn build_config(args: &BuildArgs) -> anyhow::Result<BuildConfig> {
    let config = BuildConfig {
        k: args.k,
        m: args.m,
        seed: args.seed,
        canonical_parsing: args.canonical,
        weighted: args.weighted,
        verbose: args.verbose,
        tmp_dirname: args.tmp_dir.clone(),
        ..BuildConfig::default()
    };
    config.validate()?;
    config.print();
    Ok(config)
}

fn print_summary(data: &ParseData) {
    println!("num_kmers = {}", data.num_kmers);
    println!("num_super_kmers = {}", data.strings.num_super_kmers());
    println!("num_pieces = {}", data.strings.pieces().len());
    println!("pool_bases = {}", data.strings.num_bases());
    println!("num_tuples = {}", data.minimizers.len());
    if let Some(weights) = &data.weights {
        println!("sum_of_weights = {}", weights.sum_of_weights());
        println!("num_weight_intervals = {}", weights.intervals().len());
    }
}

/// Re-read the input and verify the parse output against it: every kept
/// sequence must decode back out of its pool piece, and the tuple list must
/// tile every piece exactly, k-mer by k-mer.
fn check_command(input: &Path, config: &BuildConfig, data: &ParseData) -> anyhow::Result<()> {
    let k = config.k;
    let m = config.m;
    let sequences = read_sequences(input, k)?;
    info!(
        "checking against {} sequences with length >= k",
        sequences.len()
    );

    let mut failures = 0u64;
    let pieces = data.strings.pieces();

    if pieces.len() != sequences.len() + 1 {
        println!(
            "piece count mismatch: {} pieces for {} sequences",
            pieces.len(),
            sequences.len()
        );
        println!("\nCHECK FAILED");
        std::process::exit(1);
    }

    for (i, seq) in sequences.iter().enumerate() {
        let begin = pieces[i];
        let end = pieces[i + 1];
        if end - begin != seq.len() as u64 || data.strings.decode(begin, end - begin) != *seq {
            println!("piece {} does not reconstruct its input sequence", i);
            failures += 1;
        }
    }

    // walk the tuples: inside each piece, consecutive tuples advance by the
    // previous tuple's k-mer count, and the last one ends at the piece end
    let max_count = k - m + 1;
    let mut piece = 0usize;
    let mut expected_offset = pieces[0];
    let mut total_kmers = 0u64;
    for (idx, tuple) in data.minimizers.iter().enumerate() {
        let count = tuple.num_kmers_in_super_kmer as u64;
        if count == 0 || count > max_count {
            println!("tuple {} has out-of-range count {}", idx, count);
            failures += 1;
        }
        if tuple.offset != expected_offset {
            println!(
                "tuple {} starts at offset {} but {} was expected",
                idx, tuple.offset, expected_offset
            );
            failures += 1;
        }
        total_kmers += count;
        expected_offset = tuple.offset + count;
        if piece + 1 < pieces.len() && expected_offset + k - 1 == pieces[piece + 1] {
            piece += 1;
            expected_offset = pieces[piece];
        }
    }
    if piece + 1 != pieces.len() {
        println!("tuples cover {} of {} pieces", piece, pieces.len() - 1);
        failures += 1;
    }
    if total_kmers != data.num_kmers {
        println!(
            "tuples account for {} k-mers but the parse saw {}",
            total_kmers, data.num_kmers
        );
        failures += 1;
    }

    if failures > 0 {
        println!("\nCHECK FAILED: {} problems", failures);
        std::process::exit(1);
    }
    println!("\nCHECK PASSED");
    Ok(())
}

/// Read the sequences of an input file (plain or gzipped), keeping only
/// those long enough to hold a k-mer
fn read_sequences(path: &Path, k: u64) -> anyhow::Result<Vec<String>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open input file {}", path.display()))?;
    let reader: Box<dyn BufRead> = if path.extension().and_then(|e| e.to_str()) == Some("gz") {
        Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    };

    let mut sequences = Vec::new();
    let mut lines = reader.lines();
    while let Some(header) = lines.next() {
        header?;
        let Some(sequence) = lines.next() else { break };
        let sequence = sequence?;
        if sequence.len() as u64 >= k {
            sequences.push(sequence);
        }
    }
    Ok(sequences)
}
