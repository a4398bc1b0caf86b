use clap::Parser;
use gtf_txinfo::{run, MalformedPolicy, RunConfig, TableOptions};
use peak_alloc::PeakAlloc;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

#[global_allocator]
static PEAK_ALLOC: PeakAlloc = PeakAlloc;

/// Obtain information about every transcript of a GTF file.
///
/// A CSV file with one row per transcript is always written. With -t and/or -c,
/// additional files keep only the longest transcript of each gene, measured by
/// transcript length or by the summed length of its exons.
#[derive(Parser, Debug)]
#[command(name = "gtf-txinfo", author, version, about, long_about = None)]
#[command(after_help = "Example usage: gtf-txinfo --gtf-file Homo_sapiens.GRCh38.96.gtf --output-prefix HG38.96 -c")]
struct Cli {
    /// The GTF file to parse. If omitted, the single *.gtf file in the working directory is used.
    #[arg(short = 'g', long = "gtf-file")]
    gtf_file: Option<PathBuf>,

    /// Prefix of the output files. Defaults to the GTF path without its extension.
    #[arg(short = 'o', long = "output-prefix")]
    output_prefix: Option<PathBuf>,

    /// Also write <prefix>_Longest_Transcript.csv with the longest transcript of each gene.
    #[arg(short = 't', long = "max-transcript-length")]
    max_transcript_length: bool,

    /// Also write <prefix>_Longest_CDS.csv with the transcript of each gene with the longest CDS.
    #[arg(short = 'c', long = "max-cds")]
    max_cds: bool,

    /// What to do with records whose attributes contain a token that is not `key "value"`.
    #[arg(long, value_enum, default_value_t = MalformedPolicy::SkipToken)]
    malformed: MalformedPolicy,

    /// Fail if any exon references a transcript_id without a transcript record.
    #[arg(long)]
    strict: bool,

    /// Do not write the leading row index column.
    #[arg(long)]
    no_row_index: bool,

    /// Print more log messages (-v for debug, -vv for trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only print warnings and errors.
    #[arg(short, long)]
    quiet: bool,
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => LevelFilter::WARN,
        (false, 0) => LevelFilter::INFO,
        (false, 1) => LevelFilter::DEBUG,
        (false, _) => LevelFilter::TRACE,
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let table = TableOptions::new(cli.malformed, cli.strict, !cli.no_row_index);
    let cwd = PathBuf::from(".");
    let config = match RunConfig::resolve(
        cli.gtf_file,
        cli.output_prefix,
        &cwd,
        cli.max_transcript_length,
        cli.max_cds,
        table,
    ) {
        Ok(config) => config,
        Err(e) if e.is_input_discovery() => {
            eprintln!();
            eprintln!("{}", e);
            eprintln!();
            return ExitCode::from(1);
        }
        Err(e) => {
            eprintln!("Could not look for a GTF file in the working directory: {}", e);
            return ExitCode::from(1);
        }
    };
    debug!("{:?}", config);

    match run(&config) {
        Ok(summary) => {
            for (path, n_rows) in summary.outputs.iter() {
                info!("{:?}: {} rows", path, n_rows);
            }
            debug!(
                "Peak memory usage was {} GB",
                PEAK_ALLOC.peak_usage_as_gb()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}", e);
            for c in e.chain().skip(1) {
                eprintln!("\tCaused by: {}", c);
            }
            ExitCode::from(1)
        }
    }
}
