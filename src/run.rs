//! Query and build-store workflows.
//!
//! This is the glue the CLI binary calls into: reading inputs (FASTA files,
//! an existing `.gs` signature file, or a `--from-list` manifest), building
//! or loading the query signature(s), running the Jaccard engine against a
//! loaded `ReferenceDb`, classifying each result, and handing the rows to
//! `crate::output`. None of this logic lives in `main.rs` itself so it stays
//! testable without going through `clap`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::classify::{self, ClassificationResult};
use crate::concurrency::WorkerPool;
use crate::error::GambitError;
use crate::fasta;
use crate::jaccard;
use crate::kmer::KmerSpec;
use crate::progress::{CancellationToken, ProgressTracker};
use crate::refdb::ReferenceDb;
use crate::signature::{self, Signature};
use crate::store::{self, CompressionMode, SignatureContainer, SignatureStore};

#[cfg(feature = "tracing")]
#[allow(unused_imports)]
use tracing::{debug, info, info_span};

/// One query's classification, paired with its label and distance vector for
/// serialization.
pub type QueryRow = (String, Vec<f32>, ClassificationResult);

/// Resolves the effective database directory: `--db` flag if given, else the
/// `GAMBIT_DB_PATH` environment variable.
///
/// # Errors
///
/// Returns `GambitError::Io` wrapping `NotFound` if neither is set.
pub fn resolve_db_path(flag: Option<PathBuf>) -> Result<PathBuf, GambitError> {
    if let Some(path) = flag {
        return Ok(path);
    }
    std::env::var_os("GAMBIT_DB_PATH")
        .map(PathBuf::from)
        .ok_or_else(|| {
            GambitError::io(
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no database path given: pass --db or set GAMBIT_DB_PATH",
                ),
                "<db path>",
            )
        })
}

/// Opens the reference database rooted at `db_dir`: `db_dir/references.gs`
/// paired with `db_dir/genome.csv` and `db_dir/taxon.csv`.
///
/// # Errors
///
/// Propagates `GambitError` from `ReferenceDb::open`.
pub fn open_refdb(db_dir: &Path) -> Result<ReferenceDb, GambitError> {
    ReferenceDb::open(db_dir.join("references.gs"), db_dir)
}

/// Expands the CLI's `inputs` positional list plus an optional `--from-list`
/// manifest into a flat list of paths, in order, de-duplicated by neither
/// side (order and repeats are preserved).
///
/// # Errors
///
/// Returns `GambitError::Io` if `from_list` cannot be read.
pub fn resolve_inputs(
    inputs: &[PathBuf],
    from_list: Option<&Path>,
) -> Result<Vec<PathBuf>, GambitError> {
    let mut paths: Vec<PathBuf> = inputs.to_vec();
    if let Some(list_path) = from_list {
        let text = fs::read_to_string(list_path).map_err(|e| GambitError::io(e, list_path))?;
        for line in text.lines() {
            let line = line.trim();
            if !line.is_empty() {
                paths.push(PathBuf::from(line));
            }
        }
    }
    Ok(paths)
}

/// `true` if `path`'s extension marks it as an existing signature store
/// rather than a FASTA assembly.
fn is_signature_store(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gs"))
}

/// Builds or loads one query's signature, returning it alongside a display
/// label (the path's file stem, matching `fasta::read_genome`'s accession
/// derivation).
///
/// A `.gs` path is expected to hold exactly one signature (a query signature
/// file); anything else is read as a FASTA/FASTQ assembly and scanned with
/// [`signature::calc_signature`].
///
/// # Errors
///
/// Returns `GambitError::CorruptSignatureFile` if a `.gs` input does not
/// contain exactly one signature, or whatever `fasta::read_genome` /
/// `SignatureStore::open` report.
pub fn load_query(path: &Path, spec: &KmerSpec) -> Result<(String, Signature), GambitError> {
    if is_signature_store(path) {
        let store = SignatureStore::open(path)?;
        if store.len() != 1 {
            return Err(GambitError::CorruptSignatureFile {
                path: path.to_path_buf(),
                details: format!("expected exactly one query signature, found {}", store.len()),
            });
        }
        if store.spec() != spec {
            return Err(GambitError::DimensionMismatch {
                query: store.spec().to_string(),
                reference: spec.to_string(),
            });
        }
        let label = path
            .file_stem()
            .map_or_else(|| path.to_string_lossy().into_owned(), |s| s.to_string_lossy().into_owned());
        Ok((label, store.get(0).into_owned()))
    } else {
        let genome = fasta::read_genome(path)?;
        let signature = signature::calc_signature(spec, &genome.contigs);
        Ok((genome.accession, signature))
    }
}

/// Runs the `query` workflow over every resolved input path: builds or loads
/// each query signature, computes its distance vector against `refdb`, and
/// classifies the result.
///
/// Each input is processed independently; `token` is polled between inputs
/// so a caller driving a large batch can cancel without discarding work
/// already written to the output stream by an earlier call.
///
/// # Errors
///
/// Returns `GambitError::DimensionMismatch` if a `.gs` query's `KmerSpec`
/// disagrees with `refdb`'s, and propagates I/O and corruption errors from
/// the individual loads.
pub fn run_query(
    refdb: &ReferenceDb,
    paths: &[PathBuf],
    strict: bool,
    pool: &WorkerPool,
    token: &CancellationToken,
) -> Result<Vec<QueryRow>, GambitError> {
    #[cfg(feature = "tracing")]
    info!(num_queries = paths.len(), num_refs = refdb.num_refs(), strict, "starting query run");

    let spec = refdb.store_spec();
    let mut rows = Vec::with_capacity(paths.len());

    for path in paths {
        if token.is_cancelled() {
            return Err(GambitError::Cancelled);
        }

        #[cfg(feature = "tracing")]
        let query_span = info_span!("classify_query", path = ?path).entered();

        let (label, query) = load_query(path, spec)?;

        #[cfg(feature = "tracing")]
        debug!(signature_len = query.len(), "loaded query signature");

        let distances = jaccard::jaccard_distances(&query, refdb.store(), pool, token)?;
        let result = classify::classify(refdb, &distances, strict)
            .unwrap_or(ClassificationResult {
                predicted: None,
                primary: None,
                closest: 0,
                next: None,
                warnings: Vec::new(),
            });

        #[cfg(feature = "tracing")]
        info!(predicted = ?result.predicted, closest = result.closest, "classified query");

        #[cfg(feature = "tracing")]
        drop(query_span);

        rows.push((label, distances, result));
    }

    Ok(rows)
}

/// Runs the `build-store` workflow: reads one genome assembly per input
/// path, computes its signature under `spec`, and writes a `.gs` file to
/// `output`.
///
/// Genomes are scanned in parallel across `pool`; `token` is polled between
/// genomes (see `signature::calc_signatures_parallel`). A cancelled call
/// returns `GambitError::Cancelled` and writes nothing. Reading each input
/// off disk happens up front, sequentially, recording progress in `tracker`
/// as each genome's contigs are loaded — a caller polling `tracker.snapshot()`
/// from another thread sees read progress for batches too large to scan
/// near-instantly.
///
/// # Errors
///
/// Returns `GambitError::Io` if an input cannot be read, `GambitError::Cancelled`
/// if `token` fires mid-scan, and whatever `store::create` reports for the
/// final write.
pub fn run_build_store(
    inputs: &[PathBuf],
    output: &Path,
    spec: &KmerSpec,
    compression: CompressionMode,
    pool: &WorkerPool,
    token: &CancellationToken,
) -> Result<usize, GambitError> {
    #[cfg(feature = "tracing")]
    info!(num_inputs = inputs.len(), spec = %spec, "starting build-store run");

    let tracker = ProgressTracker::new();
    let mut ids = Vec::with_capacity(inputs.len());
    let mut contigs_per_genome: Vec<Vec<Vec<u8>>> = Vec::with_capacity(inputs.len());

    #[cfg(feature = "tracing")]
    let read_span = info_span!("read_genomes").entered();
    for path in inputs {
        let genome = fasta::read_genome(path)?;
        let bases: u64 = genome.contigs.iter().map(|c| c.len() as u64).sum();
        tracker.record_sequence(bases);
        ids.push(genome.accession);
        contigs_per_genome.push(genome.contigs);
    }
    #[cfg(feature = "tracing")]
    {
        let progress = tracker.snapshot();
        debug!(
            sequences = progress.sequences_processed,
            bases = progress.bases_processed,
            "read all genomes"
        );
        drop(read_span);
    }

    #[cfg(feature = "tracing")]
    let scan_span = info_span!("calc_signatures_parallel").entered();
    let signatures_opt = signature::calc_signatures_parallel(spec, &contigs_per_genome, pool, token);
    #[cfg(feature = "tracing")]
    drop(scan_span);

    let mut signatures = Vec::with_capacity(signatures_opt.len());
    for sig in signatures_opt {
        match sig {
            Some(s) => signatures.push(s),
            None => return Err(GambitError::Cancelled),
        }
    }

    store::create(output, spec, &signatures, Some(&ids), None, compression)?;

    #[cfg(feature = "tracing")]
    info!(n = signatures.len(), path = ?output, "wrote signature store");

    Ok(signatures.len())
}
