#![allow(clippy::too_many_lines)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;

use gambit::cli::{BuildStoreArgs, Cli, Command, QueryArgs};
use gambit::concurrency::WorkerPool;
use gambit::error::GambitError;
use gambit::kmer::KmerSpec;
use gambit::output::{self, OutputFormat};
use gambit::progress::CancellationToken;
use gambit::run;
use gambit::store::CompressionMode;

/// Initialize the tracing subscriber with environment filter.
///
/// Set `RUST_LOG=gambit=debug` to see debug output.
#[cfg(feature = "tracing")]
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}

fn main() -> ExitCode {
    #[cfg(feature = "tracing")]
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Query(args) => run_query(args),
        Command::BuildStore(args) => run_build_store(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}\n {}", "Application error:".red().bold(), err.to_string().red());
            if err.is_corruption() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run_query(args: QueryArgs) -> Result<(), GambitError> {
    let db_path = run::resolve_db_path(args.db)?;
    let refdb = run::open_refdb(&db_path)?;
    let inputs = run::resolve_inputs(&args.inputs, args.from_list.as_deref())?;

    if inputs.is_empty() {
        return Err(GambitError::Io {
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "no query inputs given"),
            path: PathBuf::from("<query inputs>"),
        });
    }

    eprintln!(
        "{}: {} ({} references)",
        "database".bold(),
        db_path.display().to_string().blue().bold(),
        refdb.num_refs()
    );
    eprintln!("{}: {}", "k-mer spec".bold(), refdb.store_spec().to_string().blue().bold());
    eprintln!(
        "{}: {}",
        "mode".bold(),
        (if args.strict { "strict" } else { "non-strict" }).blue().bold()
    );

    let pool = WorkerPool::new(args.cores)?;
    let token = CancellationToken::new();
    let rows = run::run_query(&refdb, &inputs, args.strict, &pool, &token)?;

    let stdout = std::io::stdout();
    let handle = stdout.lock();
    match args.format {
        OutputFormat::Csv => output::write_csv(handle, &refdb, &rows)?,
        OutputFormat::Json => output::write_json(handle, &refdb, &rows)?,
    }

    Ok(())
}

fn run_build_store(args: BuildStoreArgs) -> Result<(), GambitError> {
    let spec = KmerSpec::new(args.prefix.as_bytes(), args.k)?;
    let compression = args
        .gzip_block_size
        .map_or(CompressionMode::None, |signatures_per_block| CompressionMode::Gzip {
            signatures_per_block,
        });

    eprintln!("{}: {}", "k-mer spec".bold(), spec.to_string().blue().bold());
    eprintln!(
        "{}: {}",
        "inputs".bold(),
        args.inputs.len().to_string().blue().bold()
    );

    let pool = WorkerPool::new(args.cores)?;
    let token = CancellationToken::new();
    let n = run::run_build_store(&args.inputs, &args.output, &spec, compression, &pool, &token)?;

    eprintln!(
        "{}: {} ({} signatures)",
        "wrote".green().bold(),
        args.output.display().to_string().green().bold(),
        n
    );

    Ok(())
}
