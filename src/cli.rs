//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

/// Identifies bacterial genome assemblies by k-mer signature against a
/// curated reference set.
#[derive(Parser, Debug)]
#[command(name = "gambit")]
#[command(version, author, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify one or more genome assemblies against a reference database.
    Query(QueryArgs),
    /// Build a signature file from a set of FASTA assemblies.
    BuildStore(BuildStoreArgs),
}

/// Arguments for `gambit query`.
#[derive(Parser, Debug)]
pub struct QueryArgs {
    /// FASTA paths (optionally gzipped) or a single `.gs` signature file.
    /// Omit and pass `--from-list` instead for large batches.
    pub inputs: Vec<PathBuf>,

    /// A file containing one input path per line, in place of positional
    /// arguments.
    #[arg(long)]
    pub from_list: Option<PathBuf>,

    /// Directory containing `genome.csv`, `taxon.csv`, and the paired
    /// signature store. Falls back to `GAMBIT_DB_PATH` if unset.
    #[arg(long, env = "GAMBIT_DB_PATH")]
    pub db: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    pub format: OutputFormat,

    /// Use strict-mode taxon reconciliation (see `classify::classify`).
    #[arg(long)]
    pub strict: bool,

    /// Worker thread count; `0` uses all available hardware threads.
    #[arg(long, default_value_t = 0)]
    pub cores: usize,
}

/// Arguments for `gambit build-store`.
#[derive(Parser, Debug)]
pub struct BuildStoreArgs {
    /// FASTA paths (optionally gzipped), one genome assembly per file.
    pub inputs: Vec<PathBuf>,

    /// Output `.gs` path.
    #[arg(short, long)]
    pub output: PathBuf,

    /// K-mer spec prefix.
    #[arg(long, default_value = "ATGAC")]
    pub prefix: String,

    /// K-mer spec suffix length.
    #[arg(long, default_value_t = 11)]
    pub k: u8,

    /// Compress the value array in blocks of this many signatures; omit
    /// for an uncompressed store.
    #[arg(long)]
    pub gzip_block_size: Option<u32>,

    /// Worker thread count; `0` uses all available hardware threads.
    #[arg(long, default_value_t = 0)]
    pub cores: usize,
}
